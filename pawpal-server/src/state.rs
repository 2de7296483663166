//! Application state shared across all request handlers.

use pawpal_core::config::SharedConfig;
use pawpal_core::framework::DatabaseProcessor;
use pawpal_core::gateway::{PaymentGateway, RazorpayGateway};
use pawpal_core::processors::{OrderOrchestrator, WebhookReconciler};
use pawpal_core::store::{OrderStore, PetDirectory};
use sqlx::PgPool;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration, one lock per section (reloaded via SIGHUP).
    pub config: SharedConfig,
    pub orchestrator: Arc<OrderOrchestrator>,
    pub reconciler: Arc<WebhookReconciler>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pets: Arc<dyn PetDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        config: SharedConfig,
    ) -> Self {
        let orchestrator = OrderOrchestrator::new(
            store.clone(),
            pets,
            gateway,
            config.gateway.clone(),
        );
        let reconciler = WebhookReconciler::new(store, config.gateway.clone());
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            reconciler: Arc::new(reconciler),
        }
    }

    /// State backed by Postgres and the live Razorpay API.
    pub async fn with_database(db: PgPool, config: SharedConfig) -> Self {
        let processor = Arc::new(DatabaseProcessor { pool: db });
        let timeout = config.gateway.read().await.timeout;
        let gateway = Arc::new(RazorpayGateway::new(config.gateway.clone(), timeout));
        Self::new(processor.clone(), processor, gateway, config)
    }
}
