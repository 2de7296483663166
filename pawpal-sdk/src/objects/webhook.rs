//! Gateway webhook envelope and entities.
//!
//! The gateway posts `{"event": "...", "payload": {...}}` where the payload
//! nests the affected entities as `payload.payment.entity` and
//! `payload.order.entity`. [`GatewayEvent::decode`] turns the raw body into
//! a typed event once, at the boundary.

use serde::{Deserialize, Serialize};

/// Gateway metadata of a payment attempt, stored verbatim in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Gateway fee in minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<i64>,
    /// Tax on the gateway fee in minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<i64>,
}

/// `payload.payment.entity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntity {
    /// Gateway payment reference (`pay_...`).
    pub id: String,
    /// Gateway order reference (`order_...`) the attempt belongs to.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(flatten)]
    pub metadata: PaymentMetadata,
}

/// `payload.order.entity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntity {
    /// Gateway order reference (`order_...`).
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A decoded gateway event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// `payment.captured`
    PaymentCaptured(PaymentEntity),
    /// `payment.failed`
    PaymentFailed(PaymentEntity),
    /// `order.paid`; the payment entity is usually present.
    OrderPaid {
        order: OrderEntity,
        payment: Option<PaymentEntity>,
    },
    /// Any event type this server does not act on.
    Unknown { event: String },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct Wrapped<T> {
    entity: T,
}

#[derive(Deserialize)]
struct PaymentPayload {
    payment: Wrapped<PaymentEntity>,
}

#[derive(Deserialize)]
struct OrderPaidPayload {
    order: Wrapped<OrderEntity>,
    #[serde(default)]
    payment: Option<Wrapped<PaymentEntity>>,
}

impl GatewayEvent {
    pub const PAYMENT_CAPTURED: &'static str = "payment.captured";
    pub const PAYMENT_FAILED: &'static str = "payment.failed";
    pub const ORDER_PAID: &'static str = "order.paid";

    /// Decode a raw webhook body.
    ///
    /// Unknown event types decode to [`GatewayEvent::Unknown`] regardless of
    /// their payload; known ones must carry the entities they need.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        let event = match envelope.event.as_str() {
            Self::PAYMENT_CAPTURED => {
                let payload: PaymentPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::PaymentCaptured(payload.payment.entity)
            }
            Self::PAYMENT_FAILED => {
                let payload: PaymentPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::PaymentFailed(payload.payment.entity)
            }
            Self::ORDER_PAID => {
                let payload: OrderPaidPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::OrderPaid {
                    order: payload.order.entity,
                    payment: payload.payment.map(|p| p.entity),
                }
            }
            _ => GatewayEvent::Unknown {
                event: envelope.event,
            },
        };
        Ok(event)
    }

    /// The wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            GatewayEvent::PaymentCaptured(_) => Self::PAYMENT_CAPTURED,
            GatewayEvent::PaymentFailed(_) => Self::PAYMENT_FAILED,
            GatewayEvent::OrderPaid { .. } => Self::ORDER_PAID,
            GatewayEvent::Unknown { event } => event,
        }
    }
}

/// Body returned to the gateway once an event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}
