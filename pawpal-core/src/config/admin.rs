//! Admin authentication configuration.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Argon2 PHC string of the admin secret.
    secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Check a presented admin secret against the stored hash.
    pub fn verify_secret(&self, candidate: &str) -> bool {
        let Ok(hash) = PasswordHash::new(&self.secret_hash) else {
            tracing::error!("admin secret hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;

    #[test]
    fn verifies_only_the_configured_secret() {
        let salt = SaltString::from_b64("cGF3cGFsc2FsdA").unwrap();
        let hash = Argon2::default()
            .hash_password(b"correct horse", &salt)
            .unwrap()
            .to_string();
        let config = AdminConfig::new(hash);
        assert!(config.verify_secret("correct horse"));
        assert!(!config.verify_secret("battery staple"));
        assert!(!config.verify_secret(""));
    }

    #[test]
    fn malformed_hash_rejects_everything() {
        let config = AdminConfig::new("plaintext".to_string());
        assert!(!config.verify_secret("plaintext"));
    }
}
