//! Activation options accepted by interception providers.
//!
//! Options arrive as loosely-typed JSON from the interceptor host, so parsing
//! distinguishes an unknown `action` tag from a malformed payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Action tags understood by [`ActivationAction`].
pub const KNOWN_ACTIONS: &[&str] = &["setup", "launch", "intercept"];

/// One step of the provisioning state machine, as requested by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ActivationAction {
    /// Install the instrumentation server on the host.
    Setup {
        #[serde(rename = "hostId")]
        host_id: String,
    },
    /// Start the installed server.
    Launch {
        #[serde(rename = "hostId")]
        host_id: String,
    },
    /// Spawn a target with the interception script injected.
    Intercept {
        #[serde(rename = "hostId")]
        host_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
    },
}

/// Why raw activation options could not be turned into an action.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("Unknown Frida interception command: {0}")]
    UnknownAction(String),

    #[error("Invalid activation options: {0}")]
    Invalid(String),
}

impl ActivationAction {
    /// Parse raw activation options.
    ///
    /// The tag is checked against [`KNOWN_ACTIONS`] before the payload is
    /// deserialized, so an unknown tag is always reported as such even when
    /// the rest of the payload is also malformed.
    pub fn from_value(options: &Value) -> Result<Self, ActionParseError> {
        let tag = options
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ActionParseError::Invalid("missing string field 'action'".into()))?;
        if !KNOWN_ACTIONS.contains(&tag) {
            return Err(ActionParseError::UnknownAction(tag.to_string()));
        }
        serde_json::from_value(options.clone()).map_err(|e| ActionParseError::Invalid(e.to_string()))
    }

    /// The host every action applies to.
    #[must_use]
    pub fn host_id(&self) -> &str {
        match self {
            Self::Setup { host_id } | Self::Launch { host_id } | Self::Intercept { host_id, .. } => {
                host_id
            }
        }
    }
}
