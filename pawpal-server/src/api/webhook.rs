//! Gateway webhook endpoint.
//!
//! The handler takes the body as raw bytes: the signature covers the exact
//! bytes the gateway sent, so nothing may re-serialize them before the
//! reconciler has checked it. Any non-2xx answer makes the gateway redeliver.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use pawpal_core::processors::ReconcileError;
use pawpal_sdk::objects::WebhookAck;
use pawpal_sdk::signature::WEBHOOK_SIGNATURE_HEADER;

use super::error_response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/razorpay", post(razorpay_webhook))
}

/// `POST /razorpay`
async fn razorpay_webhook(
    state: State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.reconciler.handle_event(&body, signature).await?;
    tracing::debug!(?outcome, "Webhook handled");

    Ok(Json(WebhookAck { received: true }))
}

struct WebhookApiError(ReconcileError);

impl From<ReconcileError> for WebhookApiError {
    fn from(value: ReconcileError) -> Self {
        WebhookApiError(value)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        match error {
            ReconcileError::MissingSignature | ReconcileError::InvalidSignature => {
                error_response(StatusCode::UNAUTHORIZED, error.to_string())
            }
            ReconcileError::Malformed(_) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
            ReconcileError::MissingPayment(_) => {
                error_response(StatusCode::SERVICE_UNAVAILABLE, error.to_string())
            }
            ReconcileError::Store(e) => {
                tracing::error!(error = %e, "Webhook store error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}
