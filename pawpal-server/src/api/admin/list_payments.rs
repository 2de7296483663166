use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, payment_to_admin_response};

/// `GET /orders/{order_id}/payments` - every payment attempt recorded for an
/// order, oldest first.
pub async fn list_payments(
    state: State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    let payments = state.orchestrator.payments_for_order(order_id).await?;
    let response: Vec<_> = payments.iter().map(payment_to_admin_response).collect();
    Ok(Json(response))
}
