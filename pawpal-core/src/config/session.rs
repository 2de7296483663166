/// Buyer session verification settings.
#[derive(Clone)]
pub struct SessionConfig {
    secret: Box<[u8]>,
    /// Tokens older than this many seconds are rejected.
    pub max_age_secs: i64,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Box<[u8]>>, max_age_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age_secs,
        }
    }

    /// Get the secret key bytes for session HMAC signing.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}
