//! Persistence seam for orders, payments and pet listings.
//!
//! [`OrderStore`] is what the orchestrator and the reconciler talk to. The
//! production implementation lives on [`crate::framework::DatabaseProcessor`];
//! [`MemoryStore`] keeps everything in process and backs tests and local runs.
//!
//! Every status change goes through a single atomic step that re-reads the
//! current status, so concurrent reports about the same order serialize and
//! the loser observes [`Transition::Unchanged`].

mod memory;
mod postgres;

pub use memory::MemoryStore;

use crate::entities::orders::{NewOrder, OrderRecord};
use crate::entities::payments::{PaymentInsert, PaymentRecord};
use crate::entities::pets::PetListing;
use crate::entities::{OrderStatus, Transition};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("order {0} does not exist")]
    OrderNotFound(Uuid),
}

/// Outcome of recording a payment attempt against its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// The order after the step.
    pub order: OrderRecord,
    /// The ledger row after the step.
    pub payment: PaymentRecord,
    pub transition: Transition,
    /// Whether the ledger row was created by this step.
    pub payment_created: bool,
}

impl Settlement {
    /// True when the step changed nothing at all.
    pub fn is_duplicate(&self) -> bool {
        self.transition != Transition::Applied && !self.payment_created
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransition {
    pub order: OrderRecord,
    pub transition: Transition,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub buyer_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    async fn order_by_id(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError>;

    async fn order_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError>;

    async fn order_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError>;

    /// Attach the gateway order handle. Returns `false` if one is already set.
    async fn attach_gateway_order(
        &self,
        order_id: Uuid,
        gateway_order_id: &str,
    ) -> Result<bool, StoreError>;

    /// Record a captured attempt and pay the order, as one atomic step.
    async fn capture_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError>;

    /// Record a failed attempt and cancel a pending order, as one atomic step.
    async fn fail_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError>;

    /// Returns `None` if the order does not exist.
    async fn mark_delivered(&self, order_id: Uuid) -> Result<Option<OrderTransition>, StoreError>;

    async fn payment_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    async fn latest_captured_payment(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Newest first.
    async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRecord>, StoreError>;

    /// Newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>, StoreError>;
}

/// Read access to marketplace listings.
#[async_trait]
pub trait PetDirectory: Send + Sync {
    async fn pet_by_id(&self, pet_id: Uuid) -> Result<Option<PetListing>, StoreError>;
}
