pub mod action;
pub mod provider;
pub mod types;

pub use action::{ActionParseError, ActivationAction, KNOWN_ACTIONS};
pub use provider::Interceptor;
pub use types::*;
