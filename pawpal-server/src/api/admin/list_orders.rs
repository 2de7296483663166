use axum::{Json, extract::Query, extract::State, response::IntoResponse};
use pawpal_core::store::OrderFilter;
use pawpal_sdk::objects::admin::ListOrdersQuery;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, order_to_admin_response};

/// `GET /orders` - list orders with pagination and optional filters.
pub async fn list_orders(
    state: State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let records = state
        .orchestrator
        .list_orders(OrderFilter {
            status: query.status.map(Into::into),
            buyer_id: query.buyer_id,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    let response: Vec<_> = records.iter().map(order_to_admin_response).collect();
    Ok(Json(response))
}
