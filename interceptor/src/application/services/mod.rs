//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`.

pub mod config_service;
pub mod discovery;
pub mod host;
pub mod readiness;
pub mod tracking;
