//! Admin API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkout::BuyerDetails;
use super::webhook::PaymentMetadata;
use super::{OrderStatus, PaymentStatus, default_limit};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full order detail for the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOrderResponse {
    pub order_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub pet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub details: BuyerDetails,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One payment ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPaymentResponse {
    pub id: i64,
    pub order_id: Uuid,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub metadata: PaymentMetadata,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Query parameters for listing orders.
#[derive(Debug, Clone, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub status: Option<OrderStatus>,
    pub buyer_id: Option<Uuid>,
}
