// storefront/src/pipelines/mod.rs

//! The checkout and webhook sagas, and their registration.

use crate::config::AppConfig;
use crate::errors::AppError;
use saga::SagaRegistry;

pub mod common_steps;
pub mod contexts;

pub mod checkout_pipeline;
pub mod webhook_pipeline;

/// Registers every saga with `registry`. Called once while building `AppState`.
pub fn register_all_sagas(registry: &SagaRegistry<AppError>, config: &AppConfig) {
  tracing::info!("Registering sagas...");

  checkout_pipeline::register_checkout_saga(registry, config);
  webhook_pipeline::register_webhook_saga(registry, config);

  tracing::info!("All application sagas registered.");
}
