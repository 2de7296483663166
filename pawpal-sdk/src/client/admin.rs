//! Admin API client (operations tooling → checkout server).
//!
//! All requests carry the plaintext admin secret in the
//! `PawPal-Admin-Authorization` header.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::admin::{AdminOrderResponse, AdminPaymentResponse};
use crate::objects::OrderStatus;
use crate::signature::ADMIN_AUTH_HEADER;

/// Typed HTTP client for the **Admin API**.
///
/// Authentication uses a plaintext secret, verified server-side against an
/// argon2-hashed value.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    /// Create a new `AdminClient`.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/admin/orders` – list orders, optionally filtered by
    /// status.
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminOrderResponse>, ClientError> {
        let mut url = self.base_url.join("/api/v1/admin/orders")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        if let Some(status) = status {
            url.query_pairs_mut()
                .append_pair("status", &status.to_string());
        }

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/orders/{order_id}/payments` – the payment ledger of
    /// an order.
    pub async fn list_payments(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<AdminPaymentResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/orders/{order_id}/payments"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/orders/{order_id}/mark-delivered` – record that a
    /// paid order has been handed over.
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<AdminOrderResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/orders/{order_id}/mark-delivered"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }
}
