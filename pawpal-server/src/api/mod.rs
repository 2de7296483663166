//! HTTP API of the checkout server, mounted under `/api/v1`.
//!
//! - `/checkout` – buyer-facing order placement and payment confirmation
//! - `/webhooks` – gateway event deliveries
//! - `/admin`    – operator endpoints

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pawpal_sdk::objects::ApiError;
use time::PrimitiveDateTime;

use crate::state::AppState;

pub mod admin;
pub mod checkout;
pub mod extractors;
pub mod webhook;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/checkout", checkout::router())
        .nest("/webhooks", webhook::router())
        .nest("/admin", admin::router())
}

/// JSON error body with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

pub(crate) fn unix_timestamp(t: PrimitiveDateTime) -> i64 {
    t.assume_utc().unix_timestamp()
}
