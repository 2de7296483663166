use super::{OrderFilter, OrderStore, OrderTransition, PetDirectory, Settlement, StoreError};
use crate::entities::orders::{
    AttachGatewayOrder, GetOrderByGatewayOrderId, GetOrderByGatewayPaymentId, GetOrderById,
    InsertOrder, ListOrders, ListOrdersForBuyer, NewOrder, OrderRecord,
};
use crate::entities::payments::{
    GetLatestCapturedPayment, GetPaymentByGatewayId, ListPaymentsForOrder, PaymentInsert,
    PaymentRecord,
};
use crate::entities::pets::{GetPetById, PetListing};
use crate::entities::Transition;
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
enum Settle {
    Capture,
    Fail,
}

impl DatabaseProcessor {
    /// Lock the order, upsert the ledger row and apply the status change in
    /// one transaction.
    #[tracing::instrument(skip_all, err, name = "SQL:SettlePayment")]
    async fn settle(&self, payment: PaymentInsert, kind: Settle) -> Result<Settlement, StoreError> {
        let order_id = payment.order_id;
        let mut tx = self.pool.begin().await?;
        let Some(order) = OrderRecord::lock_tx(&mut tx, order_id).await? else {
            return Err(StoreError::OrderNotFound(order_id));
        };
        let (row, payment_created) = PaymentRecord::upsert_tx(&mut tx, &payment).await?;
        let transition = match kind {
            Settle::Capture => order.status.on_capture(),
            Settle::Fail => order.status.on_failure(),
        };
        let order = if transition == Transition::Applied {
            let updated = match kind {
                Settle::Capture => {
                    OrderRecord::mark_paid_tx(&mut tx, order_id, &row.gateway_payment_id).await?
                }
                Settle::Fail => OrderRecord::mark_cancelled_tx(&mut tx, order_id).await?,
            };
            updated.ok_or(StoreError::OrderNotFound(order_id))?
        } else {
            order
        };
        tx.commit().await?;
        Ok(Settlement {
            order,
            payment: row,
            transition,
            payment_created,
        })
    }
}

#[async_trait]
impl OrderStore for DatabaseProcessor {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        Ok(self.process(InsertOrder { order }).await?)
    }

    async fn order_by_id(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.process(GetOrderById { order_id }).await?)
    }

    async fn order_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let query = GetOrderByGatewayOrderId {
            gateway_order_id: gateway_order_id.to_string(),
        };
        Ok(self.process(query).await?)
    }

    async fn order_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let query = GetOrderByGatewayPaymentId {
            gateway_payment_id: gateway_payment_id.to_string(),
        };
        Ok(self.process(query).await?)
    }

    async fn attach_gateway_order(
        &self,
        order_id: Uuid,
        gateway_order_id: &str,
    ) -> Result<bool, StoreError> {
        let cmd = AttachGatewayOrder {
            order_id,
            gateway_order_id: gateway_order_id.to_string(),
        };
        match self.process(cmd).await {
            Ok(attached) => Ok(attached),
            // The handle is unique; another order already owns it.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn capture_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError> {
        self.settle(payment, Settle::Capture).await
    }

    async fn fail_payment(&self, payment: PaymentInsert) -> Result<Settlement, StoreError> {
        self.settle(payment, Settle::Fail).await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:MarkDelivered")]
    async fn mark_delivered(&self, order_id: Uuid) -> Result<Option<OrderTransition>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = OrderRecord::lock_tx(&mut tx, order_id).await? else {
            return Ok(None);
        };
        let transition = order.status.on_delivery();
        let order = if transition == Transition::Applied {
            OrderRecord::mark_delivered_tx(&mut tx, order_id)
                .await?
                .ok_or(StoreError::OrderNotFound(order_id))?
        } else {
            order
        };
        tx.commit().await?;
        Ok(Some(OrderTransition { order, transition }))
    }

    async fn payment_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let query = GetPaymentByGatewayId {
            gateway_payment_id: gateway_payment_id.to_string(),
        };
        Ok(self.process(query).await?)
    }

    async fn latest_captured_payment(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.process(GetLatestCapturedPayment { order_id }).await?)
    }

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self.process(ListPaymentsForOrder { order_id }).await?)
    }

    async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let query = ListOrdersForBuyer {
            buyer_id,
            limit,
            offset,
        };
        Ok(self.process(query).await?)
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>, StoreError> {
        let OrderFilter {
            status,
            buyer_id,
            limit,
            offset,
        } = filter;
        let query = ListOrders {
            status,
            buyer_id,
            limit,
            offset,
        };
        Ok(self.process(query).await?)
    }
}

#[async_trait]
impl PetDirectory for DatabaseProcessor {
    async fn pet_by_id(&self, pet_id: Uuid) -> Result<Option<PetListing>, StoreError> {
        Ok(self.process(GetPetById { pet_id }).await?)
    }
}
