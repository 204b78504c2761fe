//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains the code touching the local filesystem and network:
//! configuration persistence, the server binary cache, and logging setup.
//! Device bridge and instrumentation clients are supplied by the embedding
//! application.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.

pub mod config;
pub mod logging;
pub mod server_cache;
