//! Checkout API client (storefront frontend → checkout server).
//!
//! Every request carries the buyer's session token as a bearer token.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::checkout::{
    CreateOrderRequest, CreateOrderResponse, OrderResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};

/// Typed HTTP client for the **Checkout API**, acting for one buyer.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: Url,
    session_token: String,
}

impl StorefrontClient {
    /// Create a new `StorefrontClient`.
    ///
    /// * `base_url` – root URL of the checkout server.
    /// * `session_token` – the buyer's session token issued by the auth
    ///   provider.
    pub fn new(base_url: Url, session_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            session_token: session_token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/checkout/orders` – place an order and open a gateway
    /// payment for it.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ClientError> {
        let url = self.base_url.join("/api/v1/checkout/orders")?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.session_token)
            .json(request)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/checkout/verify` – forward the checkout widget's
    /// payment confirmation.
    pub async fn verify_payment(
        &self,
        request: &VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, ClientError> {
        let url = self.base_url.join("/api/v1/checkout/verify")?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.session_token)
            .json(request)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/checkout/orders/{order_id}` – fetch one of the buyer's
    /// orders.
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/checkout/orders/{order_id}"))?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.session_token)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/checkout/orders` – list the buyer's orders, newest first.
    pub async fn list_orders(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/checkout/orders")?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.session_token)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        parse_response(resp).await
    }
}
