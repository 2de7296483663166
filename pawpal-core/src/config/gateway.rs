//! Payment gateway credentials and call settings.

use pawpal_sdk::signature::{CheckoutKey, WebhookKey};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct GatewayConfig {
    /// Public key ID, handed to the checkout widget.
    pub key_id: String,
    key_secret: String,
    webhook_secret: Box<[u8]>,
    /// ISO 4217 code orders are raised in.
    pub currency: String,
    pub api_base: Url,
    /// Upper bound on a single gateway API call.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(
        key_id: String,
        key_secret: String,
        webhook_secret: impl Into<Box<[u8]>>,
        currency: String,
        api_base: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            key_id,
            key_secret,
            webhook_secret: webhook_secret.into(),
            currency,
            api_base,
            timeout,
        }
    }

    /// API key secret, used for basic auth against the gateway API.
    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }

    /// Key that checks payment confirmations from the checkout widget.
    pub fn checkout_key(&self) -> CheckoutKey {
        CheckoutKey::new(self.key_secret.as_bytes())
    }

    /// Key that checks webhook bodies.
    pub fn webhook_key(&self) -> WebhookKey {
        WebhookKey::new(self.webhook_secret.clone())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("currency", &self.currency)
            .field("api_base", &self.api_base.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
