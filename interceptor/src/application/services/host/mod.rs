//! Per-device services: probing, state resolution, provisioning, sessions
//! and cleanup.
//!
//! Each module imports only from `crate::domain` and
//! `crate::application::ports`.

pub mod cleanup;
pub mod probe;
pub mod provision;
pub mod session;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;
