use super::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::config::GatewayConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Razorpay Orders API client.
///
/// Credentials are read from the shared config on every call.
pub struct RazorpayGateway {
    config: Arc<RwLock<GatewayConfig>>,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: Arc<RwLock<GatewayConfig>>, timeout: Duration) -> Self {
        Self {
            config,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[tracing::instrument(skip_all, err, fields(receipt = %request.receipt))]
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let (url, key_id, key_secret) = {
            let config = self.config.read().await;
            let url = orders_url(&config.api_base)?;
            (
                url,
                config.key_id.clone(),
                config.key_secret().to_string(),
            )
        };

        let response = self
            .http_client
            .post(url)
            .basic_auth(key_id, Some(key_secret))
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = response.json().await.map_err(classify)?;
        debug!(gateway_order_id = %order.id, "Gateway order created");
        Ok(order)
    }
}

/// Appends `v1/orders` to the API base, keeping any path prefix it carries.
fn orders_url(api_base: &Url) -> Result<Url, GatewayError> {
    let mut url = api_base.clone();
    url.path_segments_mut()
        .map_err(|_| GatewayError::Unexpected(format!("api base {api_base} cannot carry a path")))?
        .pop_if_empty()
        .extend(["v1", "orders"]);
    Ok(url)
}

fn classify(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Request(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    const KEY_ID: &str = "rzp_test_key";
    const KEY_SECRET: &str = "rzp_test_secret";

    #[derive(Clone, Copy)]
    enum Reply {
        Created,
        Rejected,
        Stall,
    }

    #[derive(Clone)]
    struct FakeApi {
        reply: Reply,
        seen: Arc<Mutex<Option<(Option<String>, Value)>>>,
    }

    async fn orders(
        State(api): State<FakeApi>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *api.seen.lock().await = Some((auth, body.clone()));
        match api.reply {
            Reply::Created => (
                StatusCode::OK,
                Json(json!({
                    "id": "order_fake1",
                    "entity": "order",
                    "amount": body["amount"],
                    "currency": body["currency"],
                    "status": "created",
                })),
            ),
            Reply::Rejected => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "code": "BAD_REQUEST_ERROR" } })),
            ),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::OK, Json(json!({})))
            }
        }
    }

    /// Serves the fake orders API under `prefix` and returns a client for it.
    async fn spawn(
        reply: Reply,
        prefix: &str,
        timeout: Duration,
    ) -> (RazorpayGateway, FakeApi) {
        let api = FakeApi {
            reply,
            seen: Arc::new(Mutex::new(None)),
        };
        let app = Router::new()
            .route(&format!("{prefix}/v1/orders"), post(orders))
            .with_state(api.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = GatewayConfig::new(
            KEY_ID.to_string(),
            KEY_SECRET.to_string(),
            b"webhook-secret".to_vec(),
            "INR".to_string(),
            Url::parse(&format!("http://{addr}{prefix}")).unwrap(),
            timeout,
        );
        let gateway = RazorpayGateway::new(Arc::new(RwLock::new(config)), timeout);
        (gateway, api)
    }

    fn order_request() -> GatewayOrderRequest {
        GatewayOrderRequest {
            amount: 85_000,
            currency: "INR".to_string(),
            receipt: "rcpt_42".to_string(),
            notes: BTreeMap::from([("pet_id".to_string(), "p-1".to_string())]),
        }
    }

    fn expected_basic_auth() -> String {
        let request = reqwest::Client::new()
            .post("http://localhost/")
            .basic_auth(KEY_ID, Some(KEY_SECRET))
            .build()
            .unwrap();
        request.headers()[AUTHORIZATION].to_str().unwrap().to_string()
    }

    #[test]
    fn orders_url_keeps_the_path_prefix() {
        let cases = [
            ("https://api.razorpay.com", "https://api.razorpay.com/v1/orders"),
            ("https://api.razorpay.com/", "https://api.razorpay.com/v1/orders"),
            ("http://proxy.local/razorpay", "http://proxy.local/razorpay/v1/orders"),
            ("http://proxy.local/razorpay/", "http://proxy.local/razorpay/v1/orders"),
        ];
        for (base, expected) in cases {
            let url = orders_url(&Url::parse(base).unwrap()).unwrap();
            assert_eq!(url.as_str(), expected, "base {base}");
        }
    }

    #[test]
    fn opaque_api_base_is_unexpected() {
        let base = Url::parse("mailto:payments@example.com").unwrap();
        assert!(matches!(orders_url(&base), Err(GatewayError::Unexpected(_))));
    }

    #[tokio::test]
    async fn creates_an_order_with_basic_auth_and_json_body() {
        let (gateway, api) = spawn(Reply::Created, "/razorpay", Duration::from_secs(5)).await;

        let order = gateway.create_order(order_request()).await.unwrap();
        assert_eq!(order.id, "order_fake1");
        assert_eq!(order.amount, 85_000);
        assert_eq!(order.currency, "INR");

        let (auth, body) = api.seen.lock().await.clone().unwrap();
        assert_eq!(auth.as_deref(), Some(expected_basic_auth().as_str()));
        assert_eq!(
            body,
            json!({
                "amount": 85_000,
                "currency": "INR",
                "receipt": "rcpt_42",
                "notes": { "pet_id": "p-1" },
            })
        );
    }

    #[tokio::test]
    async fn rejection_carries_status_and_body() {
        let (gateway, _api) = spawn(Reply::Rejected, "", Duration::from_secs(5)).await;

        let err = gateway.create_order(order_request()).await.unwrap_err();
        match err {
            GatewayError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("BAD_REQUEST_ERROR"));
            }
            other => panic!("expected an api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let (gateway, _api) = spawn(Reply::Stall, "", Duration::from_millis(200)).await;

        let err = gateway.create_order(order_request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout), "got {err:?}");
    }
}
