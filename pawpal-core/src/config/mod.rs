//! Configuration types for the PawPal checkout.
//!
//! These types represent the validated runtime configuration used by the server
//! and shared with the core processors. Loading and parsing the TOML file is
//! handled by the server crate.

mod admin;
mod gateway;
mod server;
mod session;

pub use admin::AdminConfig;
pub use gateway::GatewayConfig;
pub use server::ServerConfig;
pub use session::SessionConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// Processors hold clones of the section they need and read it per request,
/// so a reload is picked up without restarting anything.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    pub gateway: Arc<RwLock<GatewayConfig>>,
    pub session: Arc<RwLock<SessionConfig>>,
}
