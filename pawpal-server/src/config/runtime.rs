//! Runtime configuration re-exports.
//!
//! The validated config types live in `pawpal_core::config` so the core
//! processors can hold the sections they read.

pub use pawpal_core::config::{
    AdminConfig, GatewayConfig, ServerConfig, SessionConfig, SharedConfig,
};
