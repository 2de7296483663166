use crate::entities::PaymentStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use pawpal_sdk::objects::PaymentMetadata;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

/// One row of the payment ledger: a single gateway payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: Uuid,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub metadata: Json<PaymentMetadata>,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// A payment attempt as reported by the buyer's browser or the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInsert {
    pub order_id: Uuid,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub metadata: PaymentMetadata,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
}

impl PaymentInsert {
    pub fn captured(
        order_id: Uuid,
        gateway_order_id: impl Into<String>,
        gateway_payment_id: impl Into<String>,
        amount: Decimal,
        metadata: PaymentMetadata,
    ) -> Self {
        Self {
            order_id,
            gateway_payment_id: gateway_payment_id.into(),
            gateway_order_id: gateway_order_id.into(),
            amount,
            status: PaymentStatus::Captured,
            metadata,
            error_code: None,
            error_description: None,
        }
    }
}

impl PaymentRecord {
    pub fn new(id: i64, insert: PaymentInsert, now: time::PrimitiveDateTime) -> Self {
        Self {
            id,
            order_id: insert.order_id,
            gateway_payment_id: insert.gateway_payment_id,
            gateway_order_id: insert.gateway_order_id,
            amount: insert.amount,
            status: insert.status,
            metadata: Json(insert.metadata),
            error_code: insert.error_code,
            error_description: insert.error_description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold a repeated report of the same attempt into this row.
    ///
    /// A captured row never goes back to failed and keeps its details. Empty
    /// metadata never overwrites what the gateway already told us. This must
    /// stay in step with the `ON CONFLICT` clause of [`PaymentRecord::upsert_tx`].
    pub fn merge(&mut self, insert: &PaymentInsert, now: time::PrimitiveDateTime) {
        if self.status == PaymentStatus::Captured {
            let has_details = insert.metadata != PaymentMetadata::default();
            if insert.status == PaymentStatus::Captured && has_details {
                self.metadata = Json(insert.metadata.clone());
            }
        } else {
            self.status = insert.status;
            if insert.metadata != PaymentMetadata::default() {
                self.metadata = Json(insert.metadata.clone());
            }
            if insert.error_code.is_some() {
                self.error_code.clone_from(&insert.error_code);
            }
            if insert.error_description.is_some() {
                self.error_description.clone_from(&insert.error_description);
            }
        }
        self.updated_at = now;
    }

    /// Insert a payment attempt or merge it into the existing row with the
    /// same gateway payment reference.
    ///
    /// Returns the resulting row and whether it was newly created.
    pub async fn upsert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        insert: &PaymentInsert,
    ) -> Result<(PaymentRecord, bool), sqlx::Error> {
        let row = sqlx::query_as::<_, PaymentUpsertRow>(
            r#"
            INSERT INTO payments (
                order_id, gateway_payment_id, gateway_order_id, amount, status,
                metadata, error_code, error_description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (gateway_payment_id) DO UPDATE SET
                -- captured is terminal: captured_row_is_never_regressed_by_a_failure_report
                status = CASE
                    WHEN payments.status = 'captured' THEN payments.status
                    ELSE EXCLUDED.status
                END,
                -- empty_metadata_keeps_gateway_details, failed_row_is_promoted_by_a_capture
                metadata = CASE
                    WHEN payments.status = 'captured' AND EXCLUDED.status <> 'captured'
                        THEN payments.metadata
                    WHEN EXCLUDED.metadata = '{}'::jsonb THEN payments.metadata
                    ELSE EXCLUDED.metadata
                END,
                -- failure details are history once set: failed_row_is_promoted_by_a_capture
                error_code = CASE
                    WHEN payments.status = 'captured' THEN payments.error_code
                    ELSE COALESCE(EXCLUDED.error_code, payments.error_code)
                END,
                error_description = CASE
                    WHEN payments.status = 'captured' THEN payments.error_description
                    ELSE COALESCE(EXCLUDED.error_description, payments.error_description)
                END,
                updated_at = EXCLUDED.updated_at
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(insert.order_id)
        .bind(&insert.gateway_payment_id)
        .bind(&insert.gateway_order_id)
        .bind(insert.amount)
        .bind(insert.status)
        .bind(Json(insert.metadata.clone()))
        .bind(&insert.error_code)
        .bind(&insert.error_description)
        .bind(super::utc_now())
        .fetch_one(&mut **tx)
        .await?;
        Ok((row.record, row.inserted))
    }
}

#[derive(sqlx::FromRow)]
struct PaymentUpsertRow {
    #[sqlx(flatten)]
    record: PaymentRecord,
    inserted: bool,
}

#[derive(Debug, Clone)]
pub struct GetPaymentByGatewayId {
    pub gateway_payment_id: String,
}

impl Processor<GetPaymentByGatewayId> for DatabaseProcessor {
    type Output = Option<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPaymentByGatewayId")]
    async fn process(
        &self,
        query: GetPaymentByGatewayId,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>("SELECT * FROM payments WHERE gateway_payment_id = $1")
            .bind(query.gateway_payment_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// The most recent captured attempt of an order.
pub struct GetLatestCapturedPayment {
    pub order_id: Uuid,
}

impl Processor<GetLatestCapturedPayment> for DatabaseProcessor {
    type Output = Option<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLatestCapturedPayment")]
    async fn process(
        &self,
        query: GetLatestCapturedPayment,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT * FROM payments
            WHERE order_id = $1 AND status = 'captured'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// All attempts of an order, oldest first.
pub struct ListPaymentsForOrder {
    pub order_id: Uuid,
}

impl Processor<ListPaymentsForOrder> for DatabaseProcessor {
    type Output = Vec<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPaymentsForOrder")]
    async fn process(&self, query: ListPaymentsForOrder) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(query.order_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> time::PrimitiveDateTime {
        let t = time::OffsetDateTime::from_unix_timestamp(1_760_000_000 + secs)
            .unwrap_or(time::OffsetDateTime::UNIX_EPOCH);
        time::PrimitiveDateTime::new(t.date(), t.time())
    }

    fn upi() -> PaymentMetadata {
        PaymentMetadata {
            method: Some("upi".to_string()),
            vpa: Some("asha@okbank".to_string()),
            ..Default::default()
        }
    }

    fn captured(metadata: PaymentMetadata) -> PaymentInsert {
        PaymentInsert::captured(Uuid::nil(), "order_a", "pay_1", Decimal::from(850), metadata)
    }

    fn failed(code: &str) -> PaymentInsert {
        PaymentInsert {
            status: PaymentStatus::Failed,
            error_code: Some(code.to_string()),
            error_description: Some("declined".to_string()),
            ..captured(PaymentMetadata::default())
        }
    }

    #[test]
    fn captured_row_is_never_regressed_by_a_failure_report() {
        let mut row = PaymentRecord::new(1, captured(upi()), at(0));
        row.merge(&failed("BAD_REQUEST_ERROR"), at(5));
        assert_eq!(row.status, PaymentStatus::Captured);
        assert_eq!(row.error_code, None);
        assert_eq!(row.metadata.0, upi());
        assert_eq!(row.updated_at, at(5));
    }

    #[test]
    fn empty_metadata_keeps_gateway_details() {
        let mut row = PaymentRecord::new(1, captured(upi()), at(0));
        row.merge(&captured(PaymentMetadata::default()), at(1));
        assert_eq!(row.metadata.0, upi());
    }

    #[test]
    fn failed_row_is_promoted_by_a_capture() {
        let mut row = PaymentRecord::new(1, failed("GATEWAY_ERROR"), at(0));
        row.merge(&captured(upi()), at(3));
        assert_eq!(row.status, PaymentStatus::Captured);
        assert_eq!(row.metadata.0, upi());
        // Earlier failure details stay as history.
        assert_eq!(row.error_code.as_deref(), Some("GATEWAY_ERROR"));
    }

    #[test]
    fn bare_failure_report_keeps_earlier_error_details() {
        let mut row = PaymentRecord::new(1, failed("GATEWAY_ERROR"), at(0));
        let bare = PaymentInsert {
            error_code: None,
            error_description: None,
            ..failed("unused")
        };
        row.merge(&bare, at(2));
        assert_eq!(row.status, PaymentStatus::Failed);
        assert_eq!(row.error_code.as_deref(), Some("GATEWAY_ERROR"));
        assert_eq!(row.error_description.as_deref(), Some("declined"));

        row.merge(&failed("BAD_REQUEST_ERROR"), at(4));
        assert_eq!(row.error_code.as_deref(), Some("BAD_REQUEST_ERROR"));
    }

    /// Runs `upsert_tx` against a real database and checks every merge case
    /// lands on the same row `merge` computes. Set `PAWPAL_TEST_DATABASE_URL`
    /// to a disposable Postgres database to enable it.
    #[tokio::test]
    async fn upsert_agrees_with_merge_on_postgres() {
        let Ok(url) = std::env::var("PAWPAL_TEST_DATABASE_URL") else {
            eprintln!("PAWPAL_TEST_DATABASE_URL not set, skipping");
            return;
        };
        let pool = sqlx::PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("../migrations").run(&pool).await.unwrap();

        // Everything happens in one transaction that is rolled back on drop.
        let mut tx = pool.begin().await.unwrap();
        let (pet_id, order_id) = (Uuid::new_v4(), Uuid::new_v4());
        sqlx::query("INSERT INTO pets (id, seller_id, name, price) VALUES ($1, $2, 'Biscuit', 850)")
            .bind(pet_id)
            .bind(Uuid::new_v4())
            .execute(&mut *tx)
            .await
            .unwrap();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, buyer_id, seller_id, pet_id, full_name, email, contact_number,
                delivery_address, amount, currency
            )
            VALUES ($1, $2, $3, $4, 'Asha', 'asha@example.com', '9000000000', 'Pune', 850, 'INR')
            "#,
        )
        .bind(order_id)
        .bind(Uuid::new_v4())
        .bind(Uuid::new_v4())
        .bind(pet_id)
        .execute(&mut *tx)
        .await
        .unwrap();

        let card = PaymentMetadata {
            method: Some("card".to_string()),
            ..Default::default()
        };
        let bare_failure = PaymentInsert {
            error_code: None,
            error_description: None,
            ..failed("unused")
        };
        let cases = [
            (captured(upi()), failed("BAD_REQUEST_ERROR")),
            (captured(upi()), captured(PaymentMetadata::default())),
            (captured(upi()), captured(card)),
            (failed("GATEWAY_ERROR"), captured(upi())),
            (failed("GATEWAY_ERROR"), bare_failure),
            (failed("GATEWAY_ERROR"), failed("BAD_REQUEST_ERROR")),
        ];

        for (n, (first, second)) in cases.into_iter().enumerate() {
            let reference = format!("pay_upsert_{n}_{order_id}");
            let first = PaymentInsert {
                order_id,
                gateway_payment_id: reference.clone(),
                ..first
            };
            let second = PaymentInsert {
                order_id,
                gateway_payment_id: reference,
                ..second
            };

            let (row, inserted) = PaymentRecord::upsert_tx(&mut tx, &first).await.unwrap();
            assert!(inserted, "case {n}");
            let mut expected = row.clone();
            expected.merge(&second, row.updated_at);

            let (merged, inserted) = PaymentRecord::upsert_tx(&mut tx, &second).await.unwrap();
            assert!(!inserted, "case {n}");
            assert_eq!(merged.id, row.id, "case {n}");
            assert_eq!(merged.status, expected.status, "case {n}");
            assert_eq!(merged.metadata.0, expected.metadata.0, "case {n}");
            assert_eq!(merged.error_code, expected.error_code, "case {n}");
            assert_eq!(merged.error_description, expected.error_description, "case {n}");
        }
    }
}
