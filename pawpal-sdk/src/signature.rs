//! Signature algorithm and verification for PawPal checkout.
//!
//! Every signature in the system is an HMAC-SHA256 digest. Three schemes
//! exist, each keyed by its own secret:
//!
//! * **Payment confirmation** (checkout widget → `/checkout/verify`):
//!   `hex(HMAC-SHA256("{gateway_order_id}|{gateway_payment_id}", key_secret))`
//!
//! * **Webhook** (gateway → `/webhooks/razorpay`):
//!   `hex(HMAC-SHA256(raw_body, webhook_secret))` carried in
//!   `X-Razorpay-Signature`.
//!
//! * **Buyer session** (`Authorization: Bearer ...`):
//!   `{buyer_id}.{unix_timestamp}.{base64(HMAC-SHA256("{buyer_id}.{unix_timestamp}", session_secret))}`
//!
//! Comparison is always delegated to [`ring::hmac::verify`], which runs in
//! constant time.

use uuid::Uuid;

/// Header carrying the webhook body signature.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Header for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "PawPal-Admin-Authorization";

/// Default lifetime of a buyer session token (in seconds).
pub const DEFAULT_SESSION_MAX_AGE: i64 = 24 * 60 * 60;

/// How far ahead of the server clock a session timestamp may be (in seconds).
pub const SESSION_CLOCK_SKEW: i64 = 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
    #[error("signature timestamp is in the future")]
    FromTheFuture,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// Raw HMAC-SHA256
// ---------------------------------------------------------------------------

/// Compute `hex(HMAC-SHA256(payload, secret))`.
pub fn sign(payload: &[u8], secret: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        payload,
    );
    hex::encode(tag.as_ref())
}

/// Check a hex-encoded candidate signature against `payload`.
///
/// Returns `false` for anything that is not valid hex, including an empty
/// candidate. The digest comparison itself is constant time.
pub fn verify(payload: &[u8], secret: &[u8], candidate: &str) -> bool {
    let Ok(candidate) = hex::decode(candidate.trim()) else {
        return false;
    };
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        payload,
        &candidate,
    )
    .is_ok()
}

// ---------------------------------------------------------------------------
// Typed keys
// ---------------------------------------------------------------------------

/// Gateway API key secret. Signs payment confirmations only.
#[derive(Clone)]
pub struct CheckoutKey(Box<[u8]>);

/// Gateway webhook secret. Signs webhook bodies only.
#[derive(Clone)]
pub struct WebhookKey(Box<[u8]>);

impl CheckoutKey {
    pub fn new(secret: impl Into<Box<[u8]>>) -> Self {
        Self(secret.into())
    }

    /// Sign a `(gateway_order_id, gateway_payment_id)` pair the way the
    /// checkout widget does.
    pub fn sign_payment(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        sign(
            payment_payload(gateway_order_id, gateway_payment_id).as_bytes(),
            &self.0,
        )
    }

    /// Verify the signature returned by the checkout widget.
    pub fn verify_payment(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> bool {
        verify(
            payment_payload(gateway_order_id, gateway_payment_id).as_bytes(),
            &self.0,
            signature,
        )
    }
}

impl WebhookKey {
    pub fn new(secret: impl Into<Box<[u8]>>) -> Self {
        Self(secret.into())
    }

    /// Sign a raw webhook body.
    pub fn sign_body(&self, body: &[u8]) -> String {
        sign(body, &self.0)
    }

    /// Verify the `X-Razorpay-Signature` value against the raw body.
    pub fn verify_body(&self, body: &[u8], signature: &str) -> bool {
        verify(body, &self.0, signature)
    }
}

impl std::fmt::Debug for CheckoutKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CheckoutKey(..)")
    }
}

impl std::fmt::Debug for WebhookKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookKey(..)")
    }
}

/// The message signed for a payment confirmation.
pub fn payment_payload(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{gateway_order_id}|{gateway_payment_id}")
}

// ---------------------------------------------------------------------------
// Buyer sessions
// ---------------------------------------------------------------------------

/// Issue a session token for `buyer_id` stamped with the current time.
pub fn sign_session(buyer_id: Uuid, key: &[u8]) -> String {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    sign_session_at(buyer_id, timestamp, key)
}

/// Issue a session token with an explicit timestamp.
pub fn sign_session_at(buyer_id: Uuid, timestamp: i64, key: &[u8]) -> String {
    let data = format!("{buyer_id}.{timestamp}");
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    format!(
        "{data}.{}",
        fast32::base64::RFC4648_NOPAD.encode(sig.as_ref())
    )
}

/// Verify a session token and return the buyer it identifies.
///
/// Tokens older than `max_age` seconds are rejected with
/// [`SignatureError::Expired`]; tokens stamped more than
/// [`SESSION_CLOCK_SKEW`] seconds ahead with [`SignatureError::FromTheFuture`].
pub fn verify_session(token: &str, key: &[u8], max_age: i64) -> Result<Uuid, SignatureError> {
    let mut parts = token.splitn(3, '.');
    let (Some(buyer), Some(timestamp), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SignatureError::InvalidFormat);
    };
    let buyer_id: Uuid = buyer.parse().map_err(|_| SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?;

    let data = format!("{buyer_id}.{timestamp}");
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        &signature,
    )?;

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if timestamp > now.saturating_add(SESSION_CLOCK_SKEW) {
        return Err(SignatureError::FromTheFuture);
    }
    if now.saturating_sub(timestamp) > max_age {
        return Err(SignatureError::Expired);
    }
    Ok(buyer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"rzp_secret";

    #[test]
    fn sign_then_verify_accepts() {
        let key = CheckoutKey::new(SECRET.to_vec());
        let sig = key.sign_payment("order_abc", "pay_123");
        assert_eq!(sig.len(), 64);
        assert!(key.verify_payment("order_abc", "pay_123", &sig));
    }

    #[test]
    fn any_single_byte_mutation_is_rejected() {
        let sig = sign(b"order_abc|pay_123", SECRET);
        let bytes = sig.as_bytes();
        for i in 0..bytes.len() {
            let mut mutated = bytes.to_vec();
            mutated[i] = if mutated[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(mutated).unwrap();
            assert!(
                !verify(b"order_abc|pay_123", SECRET, &mutated),
                "mutation at {i} accepted"
            );
        }
    }

    #[test]
    fn swapped_identifiers_are_rejected() {
        let key = CheckoutKey::new(SECRET.to_vec());
        let sig = key.sign_payment("order_abc", "pay_123");
        assert!(!key.verify_payment("pay_123", "order_abc", &sig));
    }

    #[test]
    fn non_hex_and_empty_candidates_are_rejected() {
        assert!(!verify(b"body", SECRET, ""));
        assert!(!verify(b"body", SECRET, "not-hex-at-all"));
        assert!(!verify(b"body", SECRET, "abc"));
    }

    #[test]
    fn webhook_and_checkout_keys_do_not_cross_verify() {
        let checkout = CheckoutKey::new(b"key_secret".to_vec());
        let webhook = WebhookKey::new(b"webhook_secret".to_vec());
        let payload = payment_payload("order_abc", "pay_123");
        let sig = webhook.sign_body(payload.as_bytes());
        assert!(webhook.verify_body(payload.as_bytes(), &sig));
        assert!(!checkout.verify_payment("order_abc", "pay_123", &sig));
    }

    #[test]
    fn known_vector_matches_gateway_format() {
        // HMAC-SHA256 with key "key" over the classic pangram.
        let sig = sign(b"The quick brown fox jumps over the lazy dog", b"key");
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn session_round_trip() {
        let buyer = Uuid::new_v4();
        let token = sign_session(buyer, SECRET);
        assert_eq!(verify_session(&token, SECRET, 60).unwrap(), buyer);
    }

    #[test]
    fn session_rejects_other_key_and_forged_buyer() {
        let buyer = Uuid::new_v4();
        let token = sign_session(buyer, SECRET);
        assert!(matches!(
            verify_session(&token, b"other", 60),
            Err(SignatureError::SignatureMismatch)
        ));

        let forged = token.replacen(&buyer.to_string(), &Uuid::new_v4().to_string(), 1);
        assert!(matches!(
            verify_session(&forged, SECRET, 60),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn session_expires() {
        let buyer = Uuid::new_v4();
        let old = time::OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let token = sign_session_at(buyer, old, SECRET);
        assert!(matches!(
            verify_session(&token, SECRET, 60),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn session_stamped_in_the_future_is_rejected() {
        let buyer = Uuid::new_v4();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();

        let slightly_ahead = sign_session_at(buyer, now + 5, SECRET);
        assert_eq!(verify_session(&slightly_ahead, SECRET, 60).unwrap(), buyer);

        let far_ahead = sign_session_at(buyer, now + 365 * 24 * 3600, SECRET);
        assert!(matches!(
            verify_session(&far_ahead, SECRET, 60),
            Err(SignatureError::FromTheFuture)
        ));

        let extreme = sign_session_at(buyer, i64::MAX, SECRET);
        assert!(matches!(
            verify_session(&extreme, SECRET, 60),
            Err(SignatureError::FromTheFuture)
        ));
    }

    #[test]
    fn ancient_session_expires_without_overflow() {
        let buyer = Uuid::new_v4();
        let token = sign_session_at(buyer, i64::MIN, SECRET);
        assert!(matches!(
            verify_session(&token, SECRET, 60),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn session_rejects_garbage() {
        assert!(matches!(
            verify_session("garbage", SECRET, 60),
            Err(SignatureError::InvalidFormat)
        ));
        let buyer = Uuid::new_v4();
        assert!(matches!(
            verify_session(&format!("{buyer}.123.@@@"), SECRET, 60),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
