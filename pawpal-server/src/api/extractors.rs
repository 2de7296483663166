//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `BuyerSession` - verifies the `Authorization: Bearer` session token and
//!   yields the buyer it was issued to (used by the Checkout API).
//! - `AdminAuth` - checks the `PawPal-Admin-Authorization` header against the
//!   configured argon2 hash (used by the Admin API).
//!
//! All cryptographic operations are delegated to [`pawpal_sdk::signature`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use pawpal_sdk::signature::{self, ADMIN_AUTH_HEADER, SignatureError};
use uuid::Uuid;

use super::error_response;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// BuyerSession - Checkout API authentication via session token
// ---------------------------------------------------------------------------

/// The authenticated buyer of a checkout request.
///
/// # Header format
///
/// ```text
/// Authorization: Bearer {buyer_id}.{unix_timestamp}.{base64_signature}
/// ```
pub struct BuyerSession(pub Uuid);

#[derive(Debug, thiserror::Error)]
pub enum BuyerSessionError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed session token")]
    Malformed,
    #[error("invalid session token")]
    Invalid,
    #[error("session expired")]
    Expired,
}

impl From<SignatureError> for BuyerSessionError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat | SignatureError::InvalidBase64 => Self::Malformed,
            SignatureError::SignatureMismatch | SignatureError::FromTheFuture => Self::Invalid,
            SignatureError::Expired => Self::Expired,
        }
    }
}

impl IntoResponse for BuyerSessionError {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, self.to_string())
    }
}

impl FromRequestParts<AppState> for BuyerSession {
    type Rejection = BuyerSessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(BuyerSessionError::MissingToken)?
            .to_str()
            .map_err(|_| BuyerSessionError::Malformed)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(BuyerSessionError::MissingToken)?
            .trim();

        let session = state.config.session.read().await;
        let buyer_id =
            signature::verify_session(token, session.secret_bytes(), session.max_age_secs)
                .inspect_err(|e| tracing::debug!(error = %e, "Rejected buyer session"))?;
        drop(session);

        Ok(BuyerSession(buyer_id))
    }
}

// ---------------------------------------------------------------------------
// AdminAuth - Admin API authentication via plaintext secret
// ---------------------------------------------------------------------------

/// Marker extractor for requests carrying a valid admin secret.
pub struct AdminAuth;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing PawPal-Admin-Authorization header")]
    MissingHeader,
    #[error("invalid admin secret")]
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, self.to_string())
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let candidate = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidSecret)?
            .to_owned();

        // argon2 verification blocks for tens of milliseconds.
        let admin = state.config.admin.read().await.clone();
        let verified = tokio::task::spawn_blocking(move || admin.verify_secret(&candidate))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Admin secret verification task failed");
                false
            });

        if verified {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected admin request with a wrong secret");
            Err(AdminAuthError::InvalidSecret)
        }
    }
}
