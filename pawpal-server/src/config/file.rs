//! TOML file configuration structures.
//!
//! These structs directly map to the `pawpal-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Payment gateway section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Public key ID handed to the checkout widget.
    pub key_id: String,
    /// API key secret. Also signs payment confirmations.
    pub key_secret: String,
    /// Secret the gateway signs webhook bodies with.
    pub webhook_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Base URL of the gateway API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_api_base() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Buyer session section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret the auth provider signs buyer session tokens with.
    pub secret: String,
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: i64,
}

fn default_session_max_age() -> i64 {
    pawpal_sdk::signature::DEFAULT_SESSION_MAX_AGE
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[gateway]
key_id = "rzp_test_abc"
key_secret = "key-secret"
webhook_secret = "hook-secret"

[session]
secret = "session-secret"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.gateway.currency, "INR");
        assert_eq!(config.gateway.api_base, "https://api.razorpay.com");
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.session.max_age_secs, 86400);
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_overrides_and_hashed_secret_detection() {
        let toml_str = r#"
[server]

[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[gateway]
key_id = "rzp_live_abc"
key_secret = "key-secret"
webhook_secret = "hook-secret"
currency = "USD"
api_base = "http://127.0.0.1:9999/"
timeout_secs = 3

[session]
secret = "session-secret"
max_age_secs = 600
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.gateway.currency, "USD");
        assert_eq!(config.gateway.timeout_secs, 3);
        assert_eq!(config.session.max_age_secs, 600);
        assert!(config.is_admin_secret_hashed());
    }

    #[test]
    fn test_missing_gateway_section_is_rejected() {
        let toml_str = r#"
[server]
[admin]
secret = "x"
[session]
secret = "y"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
