//! Configuration module for pawpal-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AdminConfig, GatewayConfig, ServerConfig, SessionConfig, SharedConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            gateway: Arc::new(RwLock::new(self.gateway)),
            session: Arc::new(RwLock::new(self.session)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        let api_base = validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, api_base, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

/// Check the file config and return the parsed gateway API base.
fn validate(config: &FileConfig) -> Result<Url, ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));
    let gateway = &config.gateway;

    if config.admin.secret.trim().is_empty() {
        return invalid("admin.secret must not be empty");
    }
    if gateway.key_id.trim().is_empty() {
        return invalid("gateway.key_id must not be empty");
    }
    if gateway.key_secret.is_empty() || gateway.webhook_secret.is_empty() {
        return invalid("gateway.key_secret and gateway.webhook_secret must not be empty");
    }
    if gateway.key_secret == gateway.webhook_secret {
        return invalid("gateway.key_secret and gateway.webhook_secret must differ");
    }
    if gateway.currency.len() != 3 || !gateway.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return invalid("gateway.currency must be a three-letter uppercase ISO 4217 code");
    }
    if gateway.timeout_secs == 0 {
        return invalid("gateway.timeout_secs must be positive");
    }
    if config.session.secret.is_empty() {
        return invalid("session.secret must not be empty");
    }
    if config.session.max_age_secs <= 0 {
        return invalid("session.max_age_secs must be positive");
    }

    let api_base = Url::parse(&gateway.api_base)
        .map_err(|e| ConfigError::ValidationError(format!("gateway.api_base: {e}")))?;
    if !matches!(api_base.scheme(), "http" | "https") || api_base.cannot_be_a_base() {
        return invalid("gateway.api_base must be an http(s) base URL");
    }
    Ok(api_base)
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig, api_base: Url, secret_hash: String) -> LoadedConfig {
    let FileConfig {
        server,
        gateway,
        session,
        ..
    } = file_config;

    LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        gateway: GatewayConfig::new(
            gateway.key_id,
            gateway.key_secret,
            gateway.webhook_secret.into_bytes(),
            gateway.currency,
            api_base,
            Duration::from_secs(gateway.timeout_secs),
        ),
        session: SessionConfig::new(session.secret.into_bytes(), session.max_age_secs),
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "let-me-in"

[gateway]
key_id = "rzp_test_abc"
key_secret = "key-secret"
webhook_secret = "hook-secret"

[session]
secret = "session-secret"
"#;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pawpal-config-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pawpal-config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn plaintext_admin_secret_is_hashed_and_rewritten() {
        let path = write_config("hash", CONFIG);
        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert!(loaded.admin.verify_secret("let-me-in"));

        let rewritten: FileConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(rewritten.is_admin_secret_hashed());

        // A second load keeps the stored hash.
        let reloaded = ConfigLoader::new(&path, None).reload().unwrap();
        assert!(reloaded.admin.verify_secret("let-me-in"));
        let again: FileConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(again.admin.secret, rewritten.admin.secret);
    }

    #[test]
    fn listen_override_wins() {
        let path = write_config("listen", CONFIG);
        let addr: SocketAddr = "127.0.0.1:4455".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(addr)).load().unwrap();
        assert_eq!(loaded.server.listen, addr);
        assert_eq!(loaded.gateway.timeout, Duration::from_secs(10));
        assert_eq!(loaded.gateway.currency, "INR");
    }

    #[test]
    fn shared_secrets_are_rejected() {
        let path = write_config(
            "same-secret",
            &CONFIG.replace("hook-secret", "key-secret"),
        );
        let err = ConfigLoader::new(&path, None).load().err().unwrap();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("differ")));
    }

    #[test]
    fn bad_currency_and_timeout_are_rejected() {
        let lowercase = CONFIG.replace(
            "webhook_secret = \"hook-secret\"",
            "webhook_secret = \"hook-secret\"\ncurrency = \"inr\"",
        );
        let path = write_config("currency", &lowercase);
        assert!(matches!(
            ConfigLoader::new(&path, None).load(),
            Err(ConfigError::ValidationError(_))
        ));

        let zero = CONFIG.replace(
            "webhook_secret = \"hook-secret\"",
            "webhook_secret = \"hook-secret\"\ntimeout_secs = 0",
        );
        let path = write_config("timeout", &zero);
        assert!(matches!(
            ConfigLoader::new(&path, None).load(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn api_base_must_be_an_http_base() {
        for base in ["mailto:payments@example.com", "ftp://example.com/razorpay"] {
            let path = write_config(
                "api-base",
                &CONFIG.replace(
                    "webhook_secret = \"hook-secret\"",
                    &format!("webhook_secret = \"hook-secret\"\napi_base = \"{base}\""),
                ),
            );
            assert!(matches!(
                ConfigLoader::new(&path, None).load(),
                Err(ConfigError::ValidationError(msg)) if msg.contains("api_base")
            ));
        }

        let path = write_config(
            "api-prefix",
            &CONFIG.replace(
                "webhook_secret = \"hook-secret\"",
                "webhook_secret = \"hook-secret\"\napi_base = \"http://127.0.0.1:9/razorpay\"",
            ),
        );
        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert_eq!(loaded.gateway.api_base.path(), "/razorpay");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ConfigLoader::new("/nonexistent/pawpal-config.toml", None)
            .load()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
