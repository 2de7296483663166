//! Checkout API handlers.
//!
//! These endpoints are called by the storefront on behalf of a signed-in
//! buyer and require an `Authorization: Bearer` session token.
//!
//! # Endpoints
//!
//! - `POST /orders`            – place an order and open a gateway order
//! - `GET  /orders`            – the buyer's orders, newest first
//! - `GET  /orders/{order_id}` – one of the buyer's orders
//! - `POST /verify`            – settle an order from the widget's signed confirmation

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use pawpal_core::entities::orders::OrderRecord;
use pawpal_core::processors::CheckoutError;
use pawpal_sdk::objects::{
    CreateOrderRequest, OrderListQuery, OrderResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};
use uuid::Uuid;

use super::extractors::BuyerSession;
use super::{error_response, unix_timestamp};
use crate::state::AppState;

/// Build the Checkout API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{order_id}", get(get_order))
        .route("/verify", post(verify_payment))
}

fn to_response(record: &OrderRecord) -> OrderResponse {
    OrderResponse {
        order_id: record.id,
        pet_id: record.pet_id,
        seller_id: record.seller_id,
        amount: record.amount,
        currency: record.currency.clone(),
        status: record.status.into(),
        gateway_order_id: record.gateway_order_id.clone(),
        gateway_payment_id: record.gateway_payment_id.clone(),
        details: record.details(),
        created_at: unix_timestamp(record.created_at),
        updated_at: unix_timestamp(record.updated_at),
    }
}

/// `POST /orders`
async fn create_order(
    state: State<AppState>,
    BuyerSession(buyer_id): BuyerSession,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let Json(request) = payload?;
    let created = state.orchestrator.create_order(buyer_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /orders`
async fn list_orders(
    state: State<AppState>,
    BuyerSession(buyer_id): BuyerSession,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let records = state
        .orchestrator
        .orders_for_buyer(buyer_id, query.limit, query.offset)
        .await?;
    let response: Vec<_> = records.iter().map(to_response).collect();
    Ok(Json(response))
}

/// `GET /orders/{order_id}`
async fn get_order(
    state: State<AppState>,
    BuyerSession(buyer_id): BuyerSession,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let record = state.orchestrator.order_for_buyer(buyer_id, order_id).await?;
    Ok(Json(to_response(&record)))
}

/// `POST /verify`
async fn verify_payment(
    state: State<AppState>,
    BuyerSession(buyer_id): BuyerSession,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let Json(request) = payload?;
    let record = state.orchestrator.verify_payment(buyer_id, request).await?;
    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully".to_string(),
        order_id: record.id,
        status: record.status.into(),
    }))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum CheckoutApiError {
    /// The request body was not valid JSON for the endpoint.
    Body(JsonRejection),
    Checkout(CheckoutError),
}

impl From<JsonRejection> for CheckoutApiError {
    fn from(value: JsonRejection) -> Self {
        CheckoutApiError::Body(value)
    }
}

impl From<CheckoutError> for CheckoutApiError {
    fn from(value: CheckoutError) -> Self {
        CheckoutApiError::Checkout(value)
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        let error = match self {
            CheckoutApiError::Body(rejection) => {
                return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
            }
            CheckoutApiError::Checkout(error) => error,
        };
        match error {
            CheckoutError::NotFound(_) => error_response(StatusCode::NOT_FOUND, error.to_string()),
            CheckoutError::Invalid(message) => error_response(StatusCode::BAD_REQUEST, message),
            CheckoutError::AmountMismatch { .. } => {
                error_response(StatusCode::BAD_REQUEST, error.to_string())
            }
            CheckoutError::InvalidSignature => error_response(
                StatusCode::BAD_REQUEST,
                "payment verification failed, contact support if you were charged",
            ),
            CheckoutError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
            CheckoutError::Upstream(e) => {
                tracing::warn!(error = %e, "Checkout API gateway error");
                error_response(
                    StatusCode::BAD_GATEWAY,
                    "payment gateway unavailable, please retry",
                )
            }
            CheckoutError::Store(e) => {
                tracing::error!(error = %e, "Checkout API store error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}
