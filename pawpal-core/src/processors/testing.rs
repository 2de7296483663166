//! Fixtures shared by the processor tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::config::GatewayConfig;
use crate::entities::pets::{PetListing, PetStatus};
use crate::gateway::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::processors::{OrderOrchestrator, WebhookReconciler};
use crate::store::MemoryStore;
use async_trait::async_trait;
use pawpal_sdk::objects::{BuyerDetails, CreateOrderRequest, CreateOrderResponse, VerifyPaymentRequest};
use pawpal_sdk::signature::{CheckoutKey, WebhookKey};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use url::Url;
use uuid::Uuid;

pub const KEY_SECRET: &str = "checkout-secret";
pub const WEBHOOK_SECRET: &[u8] = b"webhook-secret";

pub fn gateway_config() -> Arc<RwLock<GatewayConfig>> {
    Arc::new(RwLock::new(GatewayConfig::new(
        "rzp_test_key".to_string(),
        KEY_SECRET.to_string(),
        WEBHOOK_SECRET.to_vec(),
        "INR".to_string(),
        Url::parse("https://api.razorpay.com").unwrap(),
        Duration::from_secs(10),
    )))
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    WrongAmount,
}

pub struct FakeGateway {
    behavior: Behavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<GatewayOrderRequest>>,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn last_request(&self) -> Option<GatewayOrderRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().await = Some(request.clone());
        match self.behavior {
            Behavior::Succeed => Ok(GatewayOrder {
                id: format!("order_gw{n}"),
                amount: request.amount,
                currency: request.currency,
            }),
            Behavior::Fail => Err(GatewayError::Api {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
            Behavior::Hang => std::future::pending().await,
            Behavior::WrongAmount => Ok(GatewayOrder {
                id: format!("order_gw{n}"),
                amount: request.amount + 1,
                currency: request.currency,
            }),
        }
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub orchestrator: Arc<OrderOrchestrator>,
    pub reconciler: Arc<WebhookReconciler>,
    pub pet: PetListing,
    pub buyer: Uuid,
}

impl Harness {
    pub async fn new(behavior: Behavior) -> Self {
        let store = Arc::new(MemoryStore::new());
        let pet = PetListing {
            id: Uuid::now_v7(),
            seller_id: Uuid::now_v7(),
            name: "Biscuit".to_string(),
            price: Decimal::from(850),
            status: PetStatus::Available,
        };
        store.insert_pet(pet.clone()).await;
        let gateway = Arc::new(FakeGateway {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });
        let config = gateway_config();
        let orchestrator = Arc::new(OrderOrchestrator::new(
            store.clone(),
            store.clone(),
            gateway.clone(),
            config.clone(),
        ));
        let reconciler = Arc::new(WebhookReconciler::new(store.clone(), config));
        Self {
            store,
            gateway,
            orchestrator,
            reconciler,
            pet,
            buyer: Uuid::now_v7(),
        }
    }

    pub fn order_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            pet_id: self.pet.id,
            amount: self.pet.price,
            order_data: BuyerDetails {
                full_name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                contact_number: "+91 98450 00000".to_string(),
                delivery_address: "12 MG Road, Bengaluru".to_string(),
                preferred_delivery_date: None,
            },
        }
    }

    pub async fn place_order(&self) -> CreateOrderResponse {
        self.orchestrator
            .create_order(self.buyer, self.order_request())
            .await
            .unwrap()
    }

    /// What the checkout widget hands back after a successful payment.
    pub fn confirmation(&self, gateway_order_id: &str, gateway_payment_id: &str) -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: gateway_payment_id.to_string(),
            signature: CheckoutKey::new(KEY_SECRET.as_bytes())
                .sign_payment(gateway_order_id, gateway_payment_id),
        }
    }
}

/// Serialize an event and sign it the way the gateway does.
pub fn signed(event: &Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(event).unwrap();
    let signature = WebhookKey::new(WEBHOOK_SECRET).sign_body(&body);
    (body, signature)
}

pub fn payment_entity(gateway_order_id: &str, gateway_payment_id: &str, amount: i64) -> Value {
    json!({
        "id": gateway_payment_id,
        "entity": "payment",
        "amount": amount,
        "currency": "INR",
        "status": "captured",
        "order_id": gateway_order_id,
        "method": "upi",
        "vpa": "asha@okbank",
        "email": "asha@example.com",
        "contact": "+919845000000",
        "fee": 2006,
        "tax": 306
    })
}

pub fn captured_event(gateway_order_id: &str, gateway_payment_id: &str, amount: i64) -> Value {
    json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {"payment": {"entity": payment_entity(gateway_order_id, gateway_payment_id, amount)}}
    })
}

pub fn failed_event(gateway_order_id: &str, gateway_payment_id: &str) -> Value {
    let mut entity = payment_entity(gateway_order_id, gateway_payment_id, 85000);
    entity["status"] = json!("failed");
    entity["error_code"] = json!("BAD_REQUEST_ERROR");
    entity["error_description"] = json!("Payment was declined by the bank");
    json!({
        "event": "payment.failed",
        "payload": {"payment": {"entity": entity}}
    })
}

pub fn order_paid_event(gateway_order_id: &str, payment: Option<(&str, i64)>) -> Value {
    let mut payload = json!({
        "order": {"entity": {
            "id": gateway_order_id,
            "amount": 85000,
            "amount_paid": 85000,
            "currency": "INR",
            "status": "paid"
        }}
    });
    if let Some((gateway_payment_id, amount)) = payment {
        payload["payment"] =
            json!({"entity": payment_entity(gateway_order_id, gateway_payment_id, amount)});
    }
    json!({"event": "order.paid", "payload": payload})
}
