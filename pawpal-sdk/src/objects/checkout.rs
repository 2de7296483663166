//! Checkout API request and response types.
//!
//! These types are exchanged between the storefront frontend (acting for an
//! authenticated buyer) and the checkout server.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, default_limit};

/// Delivery and contact details captured when an order is placed.
///
/// Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerDetails {
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub delivery_address: String,
    #[serde(default)]
    pub preferred_delivery_date: Option<time::Date>,
}

/// Request body for `POST /checkout/orders`.
///
/// `amount` is what the buyer was shown; the server checks it against the
/// pet's current price and rejects the order on mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub pet_id: Uuid,
    pub amount: Decimal,
    pub order_data: BuyerDetails,
}

/// Everything the checkout widget needs to open a payment for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    /// Internal order ID.
    pub order_id: Uuid,
    /// Gateway order handle passed to the widget.
    pub gateway_order_id: String,
    /// Public gateway key for the widget.
    pub key: String,
    /// Amount in minor units (paise for INR).
    pub amount: i64,
    pub currency: String,
}

/// Request body for `POST /checkout/verify`.
///
/// Accepts the field names the checkout widget hands back
/// (`razorpay_order_id`, `razorpay_payment_id`, `razorpay_signature`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub order_id: Uuid,
    pub status: OrderStatus,
}

/// Buyer-facing view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub pet_id: Uuid,
    pub seller_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub details: BuyerDetails,
    /// Unix timestamp of when the order was created.
    pub created_at: i64,
    /// Unix timestamp of the last change.
    pub updated_at: i64,
}

/// Query parameters for listing the caller's orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_accepts_widget_field_names() {
        let body = r#"{
            "razorpay_order_id": "order_abc",
            "razorpay_payment_id": "pay_123",
            "razorpay_signature": "deadbeef"
        }"#;
        let req: VerifyPaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.gateway_order_id, "order_abc");
        assert_eq!(req.gateway_payment_id, "pay_123");
        assert_eq!(req.signature, "deadbeef");
    }

    #[test]
    fn create_request_accepts_numeric_amount_and_missing_date() {
        let body = r#"{
            "pet_id": "0192f5a4-7c1e-7a00-8000-000000000001",
            "amount": 850,
            "order_data": {
                "full_name": "Asha Rao",
                "email": "asha@example.com",
                "contact_number": "+91 98450 00000",
                "delivery_address": "12 MG Road, Bengaluru"
            }
        }"#;
        let req: CreateOrderRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.amount, Decimal::from(850));
        assert_eq!(req.order_data.preferred_delivery_date, None);
    }
}
