use super::{OrderFilter, OrderStore, OrderTransition, PetDirectory, Settlement, StoreError};
use crate::entities::orders::{NewOrder, OrderRecord};
use crate::entities::payments::{PaymentInsert, PaymentRecord};
use crate::entities::pets::PetListing;
use crate::entities::{OrderStatus, PaymentStatus, Transition, utc_now};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-process store. A single lock makes every operation atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    orders: HashMap<Uuid, OrderRecord>,
    payments: Vec<PaymentRecord>,
    pets: HashMap<Uuid, PetListing>,
    next_payment_id: i64,
}

impl MemoryState {
    fn upsert_payment(
        &mut self,
        insert: PaymentInsert,
        now: time::PrimitiveDateTime,
    ) -> (PaymentRecord, bool) {
        if let Some(row) = self
            .payments
            .iter_mut()
            .find(|p| p.gateway_payment_id == insert.gateway_payment_id)
        {
            row.merge(&insert, now);
            return (row.clone(), false);
        }
        self.next_payment_id += 1;
        let row = PaymentRecord::new(self.next_payment_id, insert, now);
        self.payments.push(row.clone());
        (row, true)
    }

    fn settle(
        &mut self,
        payment: PaymentInsert,
        decide: fn(OrderStatus) -> Transition,
    ) -> Result<Settlement, StoreError> {
        let order_id = payment.order_id;
        let current = self
            .orders
            .get(&order_id)
            .map(|o| o.status)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        let now = utc_now();
        let reported = payment.status;
        let (row, payment_created) = self.upsert_payment(payment, now);
        let transition = decide(current);
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if transition == Transition::Applied {
            match reported {
                PaymentStatus::Captured => {
                    order.status = OrderStatus::Paid;
                    order.gateway_payment_id = Some(row.gateway_payment_id.clone());
                }
                PaymentStatus::Failed => order.status = OrderStatus::Cancelled,
            }
            order.updated_at = now;
        }
        Ok(Settlement {
            order: order.clone(),
            payment: row,
            transition,
            payment_created,
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a listing.
    pub async fn insert_pet(&self, pet: PetListing) {
        self.state.lock().await.pets.insert(pet.id, pet);
    }

    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }
}

fn newest_first(orders: &mut [OrderRecord]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn page(orders: Vec<OrderRecord>, limit: i64, offset: i64) -> Vec<OrderRecord> {
    orders
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let record = order.into_record(utc_now());
        self.state
            .lock()
            .await
            .orders
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn order_by_id(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.state.lock().await.orders.get(&order_id).cloned())
    }

    async fn order_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.gateway_order_id.as_deref() == Some(gateway_order_id))
            .cloned())
    }

    async fn order_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.gateway_payment_id.as_deref() == Some(gateway_payment_id))
            .cloned())
    }

    async fn attach_gateway_order(
        &self,
        order_id: Uuid,
        gateway_order_id: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let taken = state
            .orders
            .values()
            .any(|o| o.gateway_order_id.as_deref() == Some(gateway_order_id));
        match state.orders.get_mut(&order_id) {
            Some(order) if order.gateway_order_id.is_none() && !taken => {
                order.gateway_order_id = Some(gateway_order_id.to_string());
                order.updated_at = utc_now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn capture_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError> {
        self.state
            .lock()
            .await
            .settle(payment, OrderStatus::on_capture)
    }

    async fn fail_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError> {
        self.state
            .lock()
            .await
            .settle(payment, OrderStatus::on_failure)
    }

    async fn mark_delivered(&self, order_id: Uuid) -> Result<Option<OrderTransition>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(order) = state.orders.get_mut(&order_id) else {
            return Ok(None);
        };
        let transition = order.status.on_delivery();
        if transition == Transition::Applied {
            order.status = OrderStatus::Delivered;
            order.updated_at = utc_now();
        }
        Ok(Some(OrderTransition {
            order: order.clone(),
            transition,
        }))
    }

    async fn payment_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.gateway_payment_id == gateway_payment_id)
            .cloned())
    }

    async fn latest_captured_payment(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.order_id == order_id && p.status == PaymentStatus::Captured)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<_> = {
            let state = self.state.lock().await;
            state
                .orders
                .values()
                .filter(|o| o.buyer_id == buyer_id)
                .cloned()
                .collect()
        };
        newest_first(&mut orders);
        Ok(page(orders, limit, offset))
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<_> = {
            let state = self.state.lock().await;
            state
                .orders
                .values()
                .filter(|o| filter.status.is_none_or(|s| o.status == s))
                .filter(|o| filter.buyer_id.is_none_or(|b| o.buyer_id == b))
                .cloned()
                .collect()
        };
        newest_first(&mut orders);
        Ok(page(orders, filter.limit, filter.offset))
    }
}

#[async_trait]
impl PetDirectory for MemoryStore {
    async fn pet_by_id(&self, pet_id: Uuid) -> Result<Option<PetListing>, StoreError> {
        Ok(self.state.lock().await.pets.get(&pet_id).cloned())
    }
}
