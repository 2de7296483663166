//! Applies signed gateway webhook events to orders and the payment ledger.
//!
//! The gateway delivers at least once and in no particular order. Every event
//! is verified against the raw body, decoded, resolved to an internal order,
//! and applied through the same atomic settle steps the checkout flow uses.
//! Events for orders this server never created are acknowledged and dropped.

use crate::config::GatewayConfig;
use crate::entities::orders::OrderRecord;
use crate::entities::payments::PaymentInsert;
use crate::entities::{PaymentStatus, Transition};
use crate::store::{OrderStore, Settlement, StoreError};
use crate::utils::money::from_minor_units;
use pawpal_sdk::objects::{GatewayEvent, OrderEntity, PaymentEntity};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("webhook signature header is missing")]
    MissingSignature,

    #[error("webhook signature is invalid")]
    InvalidSignature,

    #[error("malformed webhook body: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `order.paid` arrived without a payment and none is on record yet.
    #[error("no captured payment known for gateway order {0}")]
    MissingPayment(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// Whether the gateway should redeliver the event later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::MissingPayment(_) | ReconcileError::Store(_)
        )
    }
}

/// What a handled event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The order or the ledger changed.
    Applied,
    /// Everything the event says was already recorded.
    Duplicate,
    /// The event is not acted on, or refers to an order we do not know.
    Ignored,
}

impl From<&Settlement> for Reconciliation {
    fn from(settlement: &Settlement) -> Self {
        if settlement.is_duplicate() {
            Reconciliation::Duplicate
        } else {
            Reconciliation::Applied
        }
    }
}

pub struct WebhookReconciler {
    store: Arc<dyn OrderStore>,
    config: Arc<RwLock<GatewayConfig>>,
}

impl WebhookReconciler {
    pub fn new(store: Arc<dyn OrderStore>, config: Arc<RwLock<GatewayConfig>>) -> Self {
        Self { store, config }
    }

    /// Verify, decode and apply one webhook delivery.
    ///
    /// `raw_body` must be the exact bytes received; the signature covers them
    /// and nothing is parsed before it checks out.
    #[tracing::instrument(skip_all, err)]
    pub async fn handle_event(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<Reconciliation, ReconcileError> {
        let Some(signature) = signature else {
            warn!("Webhook without signature header");
            return Err(ReconcileError::MissingSignature);
        };
        let key = self.config.read().await.webhook_key();
        if !key.verify_body(raw_body, signature) {
            warn!(len = raw_body.len(), "Webhook signature mismatch");
            return Err(ReconcileError::InvalidSignature);
        }

        let event = GatewayEvent::decode(raw_body).inspect_err(|e| {
            warn!(error = %e, "Signed webhook body could not be decoded");
        })?;
        debug!(event = event.name(), "Webhook verified");

        match event {
            GatewayEvent::PaymentCaptured(payment) => self.payment_captured(payment).await,
            GatewayEvent::PaymentFailed(payment) => self.payment_failed(payment).await,
            GatewayEvent::OrderPaid { order, payment } => self.order_paid(order, payment).await,
            GatewayEvent::Unknown { event } => {
                info!(%event, "Ignoring unhandled webhook event");
                Ok(Reconciliation::Ignored)
            }
        }
    }

    /// Find the internal order a payment belongs to.
    ///
    /// A known ledger row wins over the order reference in the entity.
    async fn resolve_order(
        &self,
        payment: &PaymentEntity,
    ) -> Result<Option<OrderRecord>, StoreError> {
        if let Some(row) = self.store.payment_by_gateway_id(&payment.id).await? {
            return self.store.order_by_id(row.order_id).await;
        }
        if let Some(order) = self.store.order_by_gateway_payment_id(&payment.id).await? {
            return Ok(Some(order));
        }
        match payment.order_id.as_deref() {
            Some(gateway_order_id) => self.store.order_by_gateway_order_id(gateway_order_id).await,
            None => Ok(None),
        }
    }

    async fn payment_captured(
        &self,
        payment: PaymentEntity,
    ) -> Result<Reconciliation, ReconcileError> {
        let Some(order) = self.resolve_order(&payment).await? else {
            warn!(gateway_payment_id = %payment.id, "Captured payment for an unknown order");
            return Ok(Reconciliation::Ignored);
        };
        self.capture(&order, payment).await
    }

    async fn capture(
        &self,
        order: &OrderRecord,
        payment: PaymentEntity,
    ) -> Result<Reconciliation, ReconcileError> {
        let amount = from_minor_units(payment.amount);
        if amount != order.amount {
            warn!(
                order_id = %order.id,
                gateway_payment_id = %payment.id,
                captured = %amount,
                expected = %order.amount,
                "Captured amount differs from the order amount"
            );
        }
        let gateway_order_id = payment
            .order_id
            .clone()
            .or_else(|| order.gateway_order_id.clone())
            .unwrap_or_default();
        let settlement = self
            .store
            .capture_payment(PaymentInsert::captured(
                order.id,
                gateway_order_id,
                payment.id,
                amount,
                payment.metadata,
            ))
            .await?;

        match settlement.transition {
            Transition::Applied => {
                info!(order_id = %order.id, gateway_payment_id = %settlement.payment.gateway_payment_id, "Order paid by webhook");
            }
            _ if settlement.order.gateway_payment_id.as_deref()
                != Some(settlement.payment.gateway_payment_id.as_str()) =>
            {
                warn!(
                    order_id = %order.id,
                    gateway_payment_id = %settlement.payment.gateway_payment_id,
                    settled_by = ?settlement.order.gateway_payment_id,
                    "Second capture on an already settled order, refund may be needed"
                );
            }
            _ => debug!(order_id = %order.id, "Capture already recorded"),
        }
        Ok(Reconciliation::from(&settlement))
    }

    async fn payment_failed(
        &self,
        payment: PaymentEntity,
    ) -> Result<Reconciliation, ReconcileError> {
        let Some(order) = self.resolve_order(&payment).await? else {
            warn!(gateway_payment_id = %payment.id, "Failed payment for an unknown order");
            return Ok(Reconciliation::Ignored);
        };
        let gateway_order_id = payment
            .order_id
            .clone()
            .or_else(|| order.gateway_order_id.clone())
            .unwrap_or_default();
        let settlement = self
            .store
            .fail_payment(PaymentInsert {
                order_id: order.id,
                gateway_payment_id: payment.id,
                gateway_order_id,
                amount: from_minor_units(payment.amount),
                status: PaymentStatus::Failed,
                metadata: payment.metadata,
                error_code: payment.error_code,
                error_description: payment.error_description,
            })
            .await?;

        match settlement.transition {
            Transition::Applied => info!(
                order_id = %order.id,
                error_code = ?settlement.payment.error_code,
                "Order cancelled after failed payment"
            ),
            Transition::Unchanged => debug!(order_id = %order.id, "Order already cancelled"),
            Transition::Refused { current } => info!(
                order_id = %order.id,
                status = ?current,
                "Failed attempt recorded, order already settled"
            ),
        }
        Ok(Reconciliation::from(&settlement))
    }

    async fn order_paid(
        &self,
        gateway_order: OrderEntity,
        payment: Option<PaymentEntity>,
    ) -> Result<Reconciliation, ReconcileError> {
        let Some(order) = self.store.order_by_gateway_order_id(&gateway_order.id).await? else {
            warn!(gateway_order_id = %gateway_order.id, "Paid event for an unknown order");
            return Ok(Reconciliation::Ignored);
        };

        if let Some(mut payment) = payment {
            payment.order_id.get_or_insert_with(|| gateway_order.id.clone());
            return self.capture(&order, payment).await;
        }

        if order.status.is_settled() {
            debug!(order_id = %order.id, "Order already settled");
            return Ok(Reconciliation::Duplicate);
        }

        // Without a payment entity, only a capture already on record can settle it.
        let Some(row) = self.store.latest_captured_payment(order.id).await? else {
            warn!(order_id = %order.id, "Paid event without a known capture, awaiting redelivery");
            return Err(ReconcileError::MissingPayment(gateway_order.id));
        };
        let settlement = self
            .store
            .capture_payment(PaymentInsert::captured(
                order.id,
                row.gateway_order_id,
                row.gateway_payment_id,
                row.amount,
                row.metadata.0,
            ))
            .await?;
        Ok(Reconciliation::from(&settlement))
    }
}
