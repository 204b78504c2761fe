use serde::{Deserialize, Serialize};

/// Platform a host runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    Android,
}

/// How far a host is from being able to run an interception.
///
/// The order of the variants follows the provisioning pipeline:
/// `SetupRequired` needs an install, `LaunchRequired` needs the server
/// started, and `Available` accepts sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum HostState {
    Unavailable,
    SetupRequired,
    LaunchRequired,
    Available,
}

impl HostState {
    /// Wire name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::SetupRequired => "setup-required",
            Self::LaunchRequired => "launch-required",
            Self::Available => "available",
        }
    }
}

impl std::fmt::Display for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An application process that can be instrumented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub name: String,
}

/// A device able to host instrumentation targets.
///
/// Built fresh by every discovery; the device id is the only identity that
/// survives between two discoveries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub host_type: HostType,
    pub state: HostState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Target>>,
}

impl Host {
    /// An Android host whose display name is its device id.
    #[must_use]
    pub fn android(id: impl Into<String>, state: HostState) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            host_type: HostType::Android,
            state,
            targets: None,
        }
    }
}

/// Which flavour of metadata a caller asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    #[default]
    Summary,
    Detailed,
}

/// Metadata payload listing every discovered host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostsMetadata {
    pub hosts: Vec<Host>,
}

/// Metadata payload listing the targets of a single host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetsMetadata {
    pub targets: Vec<Target>,
}
