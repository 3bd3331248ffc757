// storefront/src/services/stale_orders.rs

//! Cancels checkouts abandoned between "order written" and "payment session linked".

use crate::errors::{AppError, Result};
use crate::services::order_store::OrderStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// One sweep: cancel pending, session-less orders older than `older_than`.
#[instrument(name = "stale_orders::sweep_once", skip(store))]
pub async fn sweep_once(store: &dyn OrderStore, older_than: Duration) -> Result<u64> {
  let cutoff = chrono::Duration::from_std(older_than)
    .ok()
    .and_then(|age| Utc::now().checked_sub_signed(age))
    .ok_or_else(|| AppError::Internal(format!("Stale order age {:?} is out of range", older_than)))?;
  let cancelled = store.cancel_stale_pending(cutoff).await?;
  if cancelled > 0 {
    info!(cancelled, %cutoff, "Cancelled stale pending orders.");
  }
  Ok(cancelled)
}

/// Runs `sweep_once` every `every` until the runtime shuts down. Failures are logged.
pub fn spawn_sweeper(store: Arc<dyn OrderStore>, older_than: Duration, every: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = sweep_once(store.as_ref(), older_than).await {
        error!(error = %e, "Stale order sweep failed.");
      }
    }
  })
}
