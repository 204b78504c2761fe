//! Domain types and validators for interceptor configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::InterceptorError;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.frida-interceptor/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct InterceptorConfig {
    /// Frida server settings.
    pub frida: FridaConfig,
    /// Post-launch readiness polling.
    pub readiness: ReadinessConfig,
    /// Where server binaries are cached and fetched from.
    pub server_cache: ServerCacheConfig,
    /// PEM file of the CA certificate the proxy signs with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
}

/// Frida server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FridaConfig {
    /// Server version to install. Must be a semver version.
    #[serde(default = "default_frida_version")]
    pub version: String,
}

impl Default for FridaConfig {
    fn default() -> Self {
        Self {
            version: default_frida_version(),
        }
    }
}

fn default_frida_version() -> String {
    "16.5.9".to_string()
}

/// Post-launch readiness polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Delay between two probes, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Probes made before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl ReadinessConfig {
    /// Delay between two probes.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_interval_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    10
}

/// Server binary cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ServerCacheConfig {
    /// Cache directory. Defaults to the platform cache dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// URL template with `{version}`, `{platform}` and `{arch}` placeholders,
    /// serving uncompressed server binaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Placeholders a download URL template must contain.
pub const DOWNLOAD_URL_PLACEHOLDERS: &[&str] = &["{version}", "{platform}", "{arch}"];

/// Validates a loaded configuration.
///
/// # Errors
///
/// Returns [`InterceptorError::InvalidConfig`] naming the first bad field.
pub fn validate_config(config: &InterceptorConfig) -> Result<(), InterceptorError> {
    if let Err(e) = semver::Version::parse(&config.frida.version) {
        return Err(invalid("frida.version", format!("'{}': {e}", config.frida.version)));
    }
    if config.readiness.interval_ms == 0 {
        return Err(invalid("readiness.interval_ms", "must be greater than 0".into()));
    }
    if config.readiness.max_attempts == 0 {
        return Err(invalid("readiness.max_attempts", "must be greater than 0".into()));
    }
    if let Some(url) = &config.server_cache.download_url {
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(invalid("server_cache.download_url", "must be an http(s) URL".into()));
        }
        if let Some(missing) = DOWNLOAD_URL_PLACEHOLDERS.iter().find(|p| !url.contains(**p)) {
            return Err(invalid(
                "server_cache.download_url",
                format!("missing placeholder {missing}"),
            ));
        }
    }
    Ok(())
}

/// Expand a download URL template.
#[must_use]
pub fn expand_download_url(template: &str, version: &str, platform: &str, arch: &str) -> String {
    template
        .replace("{version}", version)
        .replace("{platform}", platform)
        .replace("{arch}", arch)
}

fn invalid(field: &str, reason: String) -> InterceptorError {
    InterceptorError::InvalidConfig {
        field: field.to_string(),
        reason,
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
