//! Domain layer: pure types, constants, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod arch;
pub mod config;
pub mod device;
pub mod error;
pub mod script;

pub use arch::{FridaArch, device_abis, select_arch};
pub use config::{InterceptorConfig, validate_config};
pub use error::InterceptorError;
