//! Admin API handlers.
//!
//! These endpoints are called by the operator dashboard and require the
//! `PawPal-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `GET  /orders`                            – list orders (paginated, filterable)
//! - `GET  /orders/{order_id}/payments`        – payment ledger of an order
//! - `POST /orders/{order_id}/mark-delivered`  – hand a paid order over to delivery

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use pawpal_core::entities::orders::OrderRecord;
use pawpal_core::entities::payments::PaymentRecord;
use pawpal_core::processors::CheckoutError;
use pawpal_sdk::objects::admin::{AdminOrderResponse, AdminPaymentResponse};

use super::{error_response, unix_timestamp};
use crate::state::AppState;

mod list_orders;
mod list_payments;
mod mark_delivered;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders::list_orders))
        .route(
            "/orders/{order_id}/payments",
            get(list_payments::list_payments),
        )
        .route(
            "/orders/{order_id}/mark-delivered",
            post(mark_delivered::mark_delivered),
        )
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) struct AdminApiError(CheckoutError);

impl From<CheckoutError> for AdminApiError {
    fn from(value: CheckoutError) -> Self {
        AdminApiError(value)
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        let error = self.0;
        match error {
            CheckoutError::NotFound(_) => error_response(StatusCode::NOT_FOUND, error.to_string()),
            CheckoutError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
            CheckoutError::Store(e) => {
                tracing::error!(error = %e, "Admin API store error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            other => error_response(StatusCode::BAD_REQUEST, other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn order_to_admin_response(r: &OrderRecord) -> AdminOrderResponse {
    AdminOrderResponse {
        order_id: r.id,
        buyer_id: r.buyer_id,
        seller_id: r.seller_id,
        pet_id: r.pet_id,
        amount: r.amount,
        currency: r.currency.clone(),
        status: r.status.into(),
        gateway_order_id: r.gateway_order_id.clone(),
        gateway_payment_id: r.gateway_payment_id.clone(),
        details: r.details(),
        created_at: unix_timestamp(r.created_at),
        updated_at: unix_timestamp(r.updated_at),
    }
}

pub(crate) fn payment_to_admin_response(r: &PaymentRecord) -> AdminPaymentResponse {
    AdminPaymentResponse {
        id: r.id,
        order_id: r.order_id,
        gateway_payment_id: r.gateway_payment_id.clone(),
        gateway_order_id: r.gateway_order_id.clone(),
        amount: r.amount,
        status: r.status.into(),
        metadata: r.metadata.0.clone(),
        error_code: r.error_code.clone(),
        error_description: r.error_description.clone(),
        created_at: unix_timestamp(r.created_at),
        updated_at: unix_timestamp(r.updated_at),
    }
}
