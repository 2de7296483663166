//! Processors that drive the order and payment lifecycle.
//!
//! - `OrderOrchestrator`: buyer checkout flows and admin order operations
//! - `WebhookReconciler`: applies signed gateway events to the same records
//!
//! Both write through [`crate::store::OrderStore`], whose atomic settle steps
//! make them safe to run concurrently against the same order.

pub mod orchestrator;
pub mod reconciler;

#[cfg(test)]
mod testing;

pub use orchestrator::{CheckoutError, OrderOrchestrator};
pub use reconciler::{ReconcileError, Reconciliation, WebhookReconciler};
