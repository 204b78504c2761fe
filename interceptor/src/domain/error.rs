//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra` or `crate::application`.
//! Errors implement `thiserror::Error` and convert to `anyhow::Error` via `?`;
//! callers recover them with `anyhow::Error::downcast_ref`.

use thiserror::Error;

/// Errors raised by the provisioning pipeline and the interception façade.
#[derive(Debug, Error)]
pub enum InterceptorError {
    #[error("Could not find a supported Frida architecture among device ABIs: [{}]", abis.join(", "))]
    UnrecognizedArchitecture { abis: Vec<String> },

    #[error("Root access is required to launch the Frida server on {host_id}")]
    AccessDenied { host_id: String },

    #[error(
        "{target} was not ready after {attempts} attempts{}",
        last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default()
    )]
    ReadinessTimeout {
        target: String,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Unknown Frida interception command: {0}")]
    UnknownAction(String),

    #[error("Invalid activation options: {0}")]
    InvalidActivationOptions(String),

    #[error("No Frida server binary at {path}. Download it there or configure server_cache.download_url.")]
    MissingServerBinary { path: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl From<interceptor_common::ActionParseError> for InterceptorError {
    fn from(err: interceptor_common::ActionParseError) -> Self {
        match err {
            interceptor_common::ActionParseError::UnknownAction(tag) => Self::UnknownAction(tag),
            interceptor_common::ActionParseError::Invalid(reason) => {
                Self::InvalidActivationOptions(reason)
            }
        }
    }
}
