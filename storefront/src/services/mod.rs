// storefront/src/services/mod.rs

//! Clients for everything outside the process: identity provider, catalog and
//! order tables, payment gateway, email provider.
//!
//! Each seam is a trait so the HTTP layer can run against in-memory fakes.

pub mod catalog;
pub mod gateway_events;
pub mod identity;
pub mod notifier;
pub mod order_store;
pub mod payment_gateway;
pub mod stale_orders;
pub mod webhook_signature;

use crate::errors::{AppError, Result};
use std::future::Future;
use std::time::Duration;

pub use catalog::{Catalog, PgCatalog};
pub use gateway_events::{GatewayEvent, SessionSnapshot};
pub use identity::{IdentityVerifier, SupabaseIdentity};
pub use notifier::{Notifier, ResendNotifier};
pub use order_store::{NewOrder, NewOrderItem, OrderStore, PgOrderStore, Transition};
pub use payment_gateway::{CheckoutSession, PaymentGateway, SessionLineItem, SessionRequest, StripeGateway};

/// Awaits `fut` for at most `limit`; expiry becomes a retryable `AppError::Timeout`.
pub async fn bounded<T>(operation: &str, limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
  match tokio::time::timeout(limit, fut).await {
    Ok(result) => result,
    Err(_elapsed) => {
      tracing::warn!(operation, timeout = ?limit, "External call timed out.");
      Err(AppError::Timeout {
        operation: operation.to_string(),
      })
    }
  }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(timeout)
    .build()
    .map_err(|e| AppError::Config(format!("Unable to build HTTP client: {}", e)))
}
