use crate::entities::OrderStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use pawpal_sdk::objects::BuyerDetails;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub pet_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub delivery_address: String,
    pub preferred_delivery_date: Option<time::Date>,
    pub amount: Decimal,
    pub currency: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl OrderRecord {
    pub fn details(&self) -> BuyerDetails {
        BuyerDetails {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            contact_number: self.contact_number.clone(),
            delivery_address: self.delivery_address.clone(),
            preferred_delivery_date: self.preferred_delivery_date,
        }
    }
}

/// Everything needed to persist a fresh `pending` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub pet_id: Uuid,
    pub details: BuyerDetails,
    pub amount: Decimal,
    pub currency: String,
}

impl NewOrder {
    /// Materialize the row a store should insert, with a time-ordered ID.
    pub fn into_record(self, now: time::PrimitiveDateTime) -> OrderRecord {
        OrderRecord {
            id: Uuid::now_v7(),
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            pet_id: self.pet_id,
            full_name: self.details.full_name,
            email: self.details.email,
            contact_number: self.details.contact_number,
            delivery_address: self.details.delivery_address,
            preferred_delivery_date: self.details.preferred_delivery_date,
            amount: self.amount,
            currency: self.currency,
            gateway_order_id: None,
            gateway_payment_id: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
/// Insert a new pending order.
pub struct InsertOrder {
    pub order: NewOrder,
}

impl Processor<InsertOrder> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertOrder")]
    async fn process(&self, cmd: InsertOrder) -> Result<OrderRecord, sqlx::Error> {
        let record = cmd.order.into_record(super::utc_now());
        let order = sqlx::query_as::<_, OrderRecord>(
            r#"
            INSERT INTO orders (
                id, buyer_id, seller_id, pet_id,
                full_name, email, contact_number, delivery_address, preferred_delivery_date,
                amount, currency, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.buyer_id)
        .bind(record.seller_id)
        .bind(record.pet_id)
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(&record.contact_number)
        .bind(&record.delivery_address)
        .bind(record.preferred_delivery_date)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(OrderStatus::Pending)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }
}

#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub order_id: Uuid,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = $1")
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Look up an order by the handle the gateway issued for it.
pub struct GetOrderByGatewayOrderId {
    pub gateway_order_id: String,
}

impl Processor<GetOrderByGatewayOrderId> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByGatewayOrderId")]
    async fn process(
        &self,
        query: GetOrderByGatewayOrderId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE gateway_order_id = $1")
            .bind(query.gateway_order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Look up the order a payment settled.
pub struct GetOrderByGatewayPaymentId {
    pub gateway_payment_id: String,
}

impl Processor<GetOrderByGatewayPaymentId> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByGatewayPaymentId")]
    async fn process(
        &self,
        query: GetOrderByGatewayPaymentId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE gateway_payment_id = $1")
            .bind(query.gateway_payment_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Record the gateway order handle on an order that has none yet.
///
/// Returns whether the handle was attached.
pub struct AttachGatewayOrder {
    pub order_id: Uuid,
    pub gateway_order_id: String,
}

impl Processor<AttachGatewayOrder> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AttachGatewayOrder")]
    async fn process(&self, cmd: AttachGatewayOrder) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET gateway_order_id = $2, updated_at = $3
            WHERE id = $1 AND gateway_order_id IS NULL
            "#,
        )
        .bind(cmd.order_id)
        .bind(cmd.gateway_order_id)
        .bind(super::utc_now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
/// A buyer's orders, newest first.
pub struct ListOrdersForBuyer {
    pub buyer_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListOrdersForBuyer> for DatabaseProcessor {
    type Output = Vec<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrdersForBuyer")]
    async fn process(&self, query: ListOrdersForBuyer) -> Result<Vec<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT * FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.buyer_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Default)]
/// All orders, optionally filtered, newest first.
pub struct ListOrders {
    pub status: Option<OrderStatus>,
    pub buyer_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListOrders> for DatabaseProcessor {
    type Output = Vec<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrders")]
    async fn process(&self, query: ListOrders) -> Result<Vec<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT * FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR buyer_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.status)
        .bind(query.buyer_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}

impl OrderRecord {
    /// Load an order and hold its row lock until the transaction ends.
    pub async fn lock_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Mark an order paid by the given payment, only from `pending` or `cancelled`.
    pub async fn mark_paid_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            UPDATE orders
            SET status = 'paid', gateway_payment_id = $2, updated_at = $3
            WHERE id = $1 AND status IN ('pending', 'cancelled')
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(gateway_payment_id)
        .bind(super::utc_now())
        .fetch_optional(&mut **tx)
        .await
    }

    /// Cancel an order, only from `pending`.
    pub async fn mark_cancelled_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            UPDATE orders
            SET status = 'cancelled', updated_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(super::utc_now())
        .fetch_optional(&mut **tx)
        .await
    }

    /// Mark an order delivered, only from `paid`.
    pub async fn mark_delivered_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            UPDATE orders
            SET status = 'delivered', updated_at = $2
            WHERE id = $1 AND status = 'paid'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(super::utc_now())
        .fetch_optional(&mut **tx)
        .await
    }
}
