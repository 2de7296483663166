use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, order_to_admin_response};

/// `POST /orders/{order_id}/mark-delivered`
///
/// Only `paid` orders move; repeating the call on a delivered order is a
/// no-op that returns the order unchanged.
pub async fn mark_delivered(
    state: State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    tracing::info!(%order_id, "Admin marking order as delivered");
    let record = state.orchestrator.mark_delivered(order_id).await?;
    Ok(Json(order_to_admin_response(&record)))
}
