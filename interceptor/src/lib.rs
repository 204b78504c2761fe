//! Android Frida interceptor: discovers adb devices, provisions a Frida
//! server on them, and spawns apps with an interception script injected.
//!
//! Device bridge and instrumentation clients are supplied by the embedding
//! application through the traits in [`application::ports`].

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;
pub mod interceptor;

pub use interceptor::{ACTIVABLE_TIMEOUT, FridaInterceptor, INTERCEPTOR_ID, INTERCEPTOR_VERSION};
