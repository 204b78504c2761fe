//! Application service: configuration use-cases.

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::InterceptorConfig;
use crate::domain::validate_config;

/// Load and validate configuration.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a value is invalid.
pub fn load_config(store: &impl ConfigStore) -> Result<InterceptorConfig> {
    let config = store.load()?;
    validate_config(&config).with_context(|| match store.path() {
        Ok(path) => format!("invalid configuration in {}", path.display()),
        Err(_) => "invalid configuration".to_string(),
    })?;
    Ok(config)
}

/// Validate, then save configuration.
///
/// # Errors
///
/// Returns an error if a value is invalid or the store cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &InterceptorConfig) -> Result<()> {
    validate_config(config)?;
    store.save(config)
}
