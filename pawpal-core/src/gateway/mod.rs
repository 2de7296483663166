//! Outbound payment gateway integration.
//!
//! The orchestrator only needs one gateway call: registering an order so the
//! checkout widget can open a payment for it. [`PaymentGateway`] is that seam;
//! [`RazorpayGateway`] is the production implementation.

mod razorpay;

pub use razorpay::RazorpayGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from a gateway API call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway did not answer in time")]
    Timeout,

    #[error("gateway rejected the request with status {status}: {body}")]
    Api { status: u16, body: String },

    /// The gateway answered, but not with what was asked for.
    #[error("unexpected gateway response: {0}")]
    Unexpected(String),
}

/// Body of the gateway's create-order call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// The gateway's order handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: GatewayOrderRequest)
    -> Result<GatewayOrder, GatewayError>;
}
