pub mod orders;
pub mod payments;
pub mod pets;

use pawpal_sdk::objects::{OrderStatus as SdkOrderStatus, PaymentStatus as SdkPaymentStatus};

/// Order lifecycle status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `pawpal_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
    Delivered,
}

/// Result of asking an order to move to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changed.
    Applied,
    /// The order already reflects the requested outcome.
    Unchanged,
    /// The move is not allowed from the current status.
    Refused { current: OrderStatus },
}

impl OrderStatus {
    /// A proven capture pays the order unless it is already settled.
    ///
    /// Cancelled orders are revived: a capture is money the buyer parted with,
    /// even if an earlier attempt on the same order failed.
    pub fn on_capture(self) -> Transition {
        match self {
            OrderStatus::Pending | OrderStatus::Cancelled => Transition::Applied,
            OrderStatus::Paid | OrderStatus::Delivered => Transition::Unchanged,
        }
    }

    /// A failed attempt cancels a pending order and never touches a settled one.
    pub fn on_failure(self) -> Transition {
        match self {
            OrderStatus::Pending => Transition::Applied,
            OrderStatus::Cancelled => Transition::Unchanged,
            current @ (OrderStatus::Paid | OrderStatus::Delivered) => {
                Transition::Refused { current }
            }
        }
    }

    pub fn on_delivery(self) -> Transition {
        match self {
            OrderStatus::Paid => Transition::Applied,
            OrderStatus::Delivered => Transition::Unchanged,
            current @ (OrderStatus::Pending | OrderStatus::Cancelled) => {
                Transition::Refused { current }
            }
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Delivered)
    }
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::Paid => SdkOrderStatus::Paid,
            OrderStatus::Cancelled => SdkOrderStatus::Cancelled,
            OrderStatus::Delivered => SdkOrderStatus::Delivered,
        }
    }
}

impl From<SdkOrderStatus> for OrderStatus {
    fn from(value: SdkOrderStatus) -> Self {
        match value {
            SdkOrderStatus::Pending => OrderStatus::Pending,
            SdkOrderStatus::Paid => OrderStatus::Paid,
            SdkOrderStatus::Cancelled => OrderStatus::Cancelled,
            SdkOrderStatus::Delivered => OrderStatus::Delivered,
        }
    }
}

/// Payment ledger status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_status")]
pub enum PaymentStatus {
    Captured,
    Failed,
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Captured => SdkPaymentStatus::Captured,
            PaymentStatus::Failed => SdkPaymentStatus::Failed,
        }
    }
}

impl From<SdkPaymentStatus> for PaymentStatus {
    fn from(value: SdkPaymentStatus) -> Self {
        match value {
            SdkPaymentStatus::Captured => PaymentStatus::Captured,
            SdkPaymentStatus::Failed => PaymentStatus::Failed,
        }
    }
}

/// Current UTC wall time as stored in `TIMESTAMP` columns.
pub fn utc_now() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_settles_pending_and_revives_cancelled() {
        assert_eq!(OrderStatus::Pending.on_capture(), Transition::Applied);
        assert_eq!(OrderStatus::Cancelled.on_capture(), Transition::Applied);
        assert_eq!(OrderStatus::Paid.on_capture(), Transition::Unchanged);
        assert_eq!(OrderStatus::Delivered.on_capture(), Transition::Unchanged);
    }

    #[test]
    fn failure_never_regresses_a_settled_order() {
        assert_eq!(OrderStatus::Pending.on_failure(), Transition::Applied);
        assert_eq!(OrderStatus::Cancelled.on_failure(), Transition::Unchanged);
        assert_eq!(
            OrderStatus::Paid.on_failure(),
            Transition::Refused {
                current: OrderStatus::Paid
            }
        );
        assert_eq!(
            OrderStatus::Delivered.on_failure(),
            Transition::Refused {
                current: OrderStatus::Delivered
            }
        );
    }

    #[test]
    fn only_paid_orders_can_be_delivered() {
        assert_eq!(OrderStatus::Paid.on_delivery(), Transition::Applied);
        assert_eq!(OrderStatus::Delivered.on_delivery(), Transition::Unchanged);
        assert!(matches!(
            OrderStatus::Pending.on_delivery(),
            Transition::Refused { .. }
        ));
        assert!(matches!(
            OrderStatus::Cancelled.on_delivery(),
            Transition::Refused { .. }
        ));
    }

    #[test]
    fn sdk_status_conversion_is_lossless() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            OrderStatus::Delivered,
        ] {
            let sdk: SdkOrderStatus = status.into();
            assert_eq!(OrderStatus::from(sdk), status);
        }
    }
}
