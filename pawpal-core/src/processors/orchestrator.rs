//! Buyer-facing checkout flows.
//!
//! `create_order` persists a pending order at the listing's current price and
//! registers it with the gateway. `verify_payment` accepts the signed
//! confirmation the checkout widget hands back to the buyer's browser and
//! settles the order. Neither trusts client-supplied amounts or statuses.

use crate::config::GatewayConfig;
use crate::entities::Transition;
use crate::entities::orders::{NewOrder, OrderRecord};
use crate::entities::payments::{PaymentInsert, PaymentRecord};
use crate::entities::pets::PetStatus;
use crate::gateway::{GatewayError, GatewayOrderRequest, PaymentGateway};
use crate::store::{OrderFilter, OrderStore, PetDirectory, StoreError};
use crate::utils::money::to_minor_units;
use pawpal_sdk::objects::{
    BuyerDetails, CreateOrderRequest, CreateOrderResponse, OrderStatus as SdkOrderStatus,
    PaymentMetadata, VerifyPaymentRequest, clamp_pagination,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("amount {declared} does not match the current price {price}")]
    AmountMismatch { declared: Decimal, price: Decimal },

    #[error("payment signature is invalid")]
    InvalidSignature,

    #[error("{0}")]
    Conflict(String),

    #[error("payment gateway error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::OrderNotFound(_) => CheckoutError::NotFound("order"),
            other => CheckoutError::Store(other),
        }
    }
}

pub struct OrderOrchestrator {
    store: Arc<dyn OrderStore>,
    pets: Arc<dyn PetDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    config: Arc<RwLock<GatewayConfig>>,
}

impl OrderOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pets: Arc<dyn PetDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        config: Arc<RwLock<GatewayConfig>>,
    ) -> Self {
        Self {
            store,
            pets,
            gateway,
            config,
        }
    }

    /// Place an order for a pet and open a gateway order for it.
    ///
    /// The order row is written before the gateway is called. If the gateway
    /// fails or times out the order stays `pending` without a gateway handle
    /// and the buyer may simply place a new one.
    #[tracing::instrument(skip_all, err, fields(buyer_id = %buyer_id, pet_id = %request.pet_id))]
    pub async fn create_order(
        &self,
        buyer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, CheckoutError> {
        validate_details(&request.order_data)?;

        let pet = self
            .pets
            .pet_by_id(request.pet_id)
            .await?
            .ok_or(CheckoutError::NotFound("pet"))?;
        if pet.status != PetStatus::Available {
            return Err(CheckoutError::Conflict(
                "pet is no longer available".to_string(),
            ));
        }
        if request.amount != pet.price {
            warn!(declared = %request.amount, price = %pet.price, "Declared amount differs from price");
            return Err(CheckoutError::AmountMismatch {
                declared: request.amount,
                price: pet.price,
            });
        }
        let minor = to_minor_units(pet.price).ok_or_else(|| {
            CheckoutError::Invalid(format!("price {} cannot be charged", pet.price))
        })?;

        let (key_id, currency, timeout) = {
            let config = self.config.read().await;
            (
                config.key_id.clone(),
                config.currency.clone(),
                config.timeout,
            )
        };

        let order = self
            .store
            .insert_order(NewOrder {
                buyer_id,
                seller_id: pet.seller_id,
                pet_id: pet.id,
                details: request.order_data,
                amount: pet.price,
                currency: currency.clone(),
            })
            .await?;

        let notes = BTreeMap::from([
            ("order_id".to_string(), order.id.to_string()),
            ("pet_id".to_string(), pet.id.to_string()),
            ("pet_name".to_string(), pet.name.clone()),
        ]);
        let gateway_request = GatewayOrderRequest {
            amount: minor,
            currency: currency.clone(),
            receipt: format!("order_{}", order.id),
            notes,
        };

        let gateway_order =
            match tokio::time::timeout(timeout, self.gateway.create_order(gateway_request)).await {
                Ok(Ok(gateway_order)) => gateway_order,
                Ok(Err(e)) => {
                    warn!(order_id = %order.id, error = %e, "Gateway order creation failed");
                    return Err(e.into());
                }
                Err(_) => {
                    warn!(order_id = %order.id, ?timeout, "Gateway order creation timed out");
                    return Err(GatewayError::Timeout.into());
                }
            };

        if gateway_order.amount != minor || gateway_order.currency != currency {
            warn!(
                order_id = %order.id,
                gateway_order_id = %gateway_order.id,
                "Gateway order does not match the requested charge"
            );
            return Err(GatewayError::Unexpected(format!(
                "gateway order {} is for {} {}, expected {} {}",
                gateway_order.id, gateway_order.amount, gateway_order.currency, minor, currency
            ))
            .into());
        }

        if !self
            .store
            .attach_gateway_order(order.id, &gateway_order.id)
            .await?
        {
            return Err(CheckoutError::Conflict(format!(
                "gateway order {} is already attached",
                gateway_order.id
            )));
        }

        info!(
            order_id = %order.id,
            gateway_order_id = %gateway_order.id,
            amount = minor,
            "Order created"
        );

        Ok(CreateOrderResponse {
            order_id: order.id,
            gateway_order_id: gateway_order.id,
            key: key_id,
            amount: gateway_order.amount,
            currency: gateway_order.currency,
        })
    }

    /// Settle an order from the checkout widget's signed confirmation.
    ///
    /// The signature is checked before any lookup. Re-submitting the same
    /// confirmation, or racing the gateway's webhook, is harmless.
    #[tracing::instrument(skip_all, err, fields(buyer_id = %buyer_id, gateway_order_id = %request.gateway_order_id))]
    pub async fn verify_payment(
        &self,
        buyer_id: Uuid,
        request: VerifyPaymentRequest,
    ) -> Result<OrderRecord, CheckoutError> {
        let VerifyPaymentRequest {
            gateway_order_id,
            gateway_payment_id,
            signature,
        } = request;
        if gateway_order_id.trim().is_empty()
            || gateway_payment_id.trim().is_empty()
            || signature.trim().is_empty()
        {
            return Err(CheckoutError::Invalid(
                "missing payment verification data".to_string(),
            ));
        }

        let key = self.config.read().await.checkout_key();
        if !key.verify_payment(&gateway_order_id, &gateway_payment_id, &signature) {
            warn!(%gateway_payment_id, "Payment signature mismatch");
            return Err(CheckoutError::InvalidSignature);
        }

        let order = self
            .store
            .order_by_gateway_order_id(&gateway_order_id)
            .await?
            .filter(|o| o.buyer_id == buyer_id)
            .ok_or(CheckoutError::NotFound("order"))?;

        let settlement = self
            .store
            .capture_payment(PaymentInsert::captured(
                order.id,
                gateway_order_id,
                gateway_payment_id,
                order.amount,
                PaymentMetadata::default(),
            ))
            .await?;

        match settlement.transition {
            Transition::Applied => {
                info!(order_id = %order.id, gateway_payment_id = %settlement.payment.gateway_payment_id, "Order paid");
            }
            Transition::Unchanged => {
                debug!(order_id = %order.id, status = ?settlement.order.status, "Order already settled");
            }
            Transition::Refused { current } => {
                return Err(CheckoutError::Conflict(format!(
                    "order is {}",
                    SdkOrderStatus::from(current)
                )));
            }
        }
        Ok(settlement.order)
    }

    /// One of the buyer's own orders. Other buyers' orders are reported as missing.
    pub async fn order_for_buyer(
        &self,
        buyer_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderRecord, CheckoutError> {
        self.store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.buyer_id == buyer_id)
            .ok_or(CheckoutError::NotFound("order"))
    }

    /// The buyer's orders, newest first.
    pub async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRecord>, CheckoutError> {
        let (limit, offset) = clamp_pagination(limit, offset);
        Ok(self.store.orders_for_buyer(buyer_id, limit, offset).await?)
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>, CheckoutError> {
        let (limit, offset) = clamp_pagination(filter.limit, filter.offset);
        Ok(self
            .store
            .list_orders(OrderFilter {
                limit,
                offset,
                ..filter
            })
            .await?)
    }

    pub async fn payments_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, CheckoutError> {
        if self.store.order_by_id(order_id).await?.is_none() {
            return Err(CheckoutError::NotFound("order"));
        }
        Ok(self.store.payments_for_order(order_id).await?)
    }

    /// Hand a paid order over to delivery.
    #[tracing::instrument(skip(self), err)]
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<OrderRecord, CheckoutError> {
        let outcome = self
            .store
            .mark_delivered(order_id)
            .await?
            .ok_or(CheckoutError::NotFound("order"))?;
        match outcome.transition {
            Transition::Applied => info!("Order delivered"),
            Transition::Unchanged => debug!("Order already delivered"),
            Transition::Refused { current } => {
                return Err(CheckoutError::Conflict(format!(
                    "order is {}, only paid orders can be delivered",
                    SdkOrderStatus::from(current)
                )));
            }
        }
        Ok(outcome.order)
    }
}

fn validate_details(details: &BuyerDetails) -> Result<(), CheckoutError> {
    let required = [
        ("full_name", &details.full_name),
        ("email", &details.email),
        ("contact_number", &details.contact_number),
        ("delivery_address", &details.delivery_address),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(CheckoutError::Invalid(format!("{field} is required")));
        }
    }
    if !details.email.contains('@') {
        return Err(CheckoutError::Invalid("email is not valid".to_string()));
    }
    Ok(())
}
