// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::{
  Catalog, IdentityVerifier, Notifier, OrderStore, PaymentGateway, PgCatalog, PgOrderStore, ResendNotifier,
  StripeGateway, SupabaseIdentity,
};
use saga::SagaRegistry;
use sqlx::PgPool;
use std::sync::Arc;

/// The external systems the sagas talk to.
#[derive(Clone)]
pub struct Collaborators {
  pub orders: Arc<dyn OrderStore>,
  pub catalog: Arc<dyn Catalog>,
  pub identity: Arc<dyn IdentityVerifier>,
  pub gateway: Arc<dyn PaymentGateway>,
  /// `None` when email credentials are not configured.
  pub notifier: Option<Arc<dyn Notifier>>,
}

impl Collaborators {
  /// Production clients: Postgres for orders and catalog, HTTP for the rest.
  pub fn connect(config: &AppConfig, pool: PgPool) -> Result<Self> {
    let limit = config.external_call_timeout;
    let notifier = match &config.email {
      Some(email) => Some(Arc::new(ResendNotifier::new(
        config.resend_api_base.clone(),
        email.api_key.clone(),
        email.from_address.clone(),
        config.store_name.clone(),
        limit,
      )?) as Arc<dyn Notifier>),
      None => None,
    };
    Ok(Self {
      orders: Arc::new(PgOrderStore::new(pool.clone())),
      catalog: Arc::new(PgCatalog::new(pool)),
      identity: Arc::new(SupabaseIdentity::new(
        config.identity_url.clone(),
        config.identity_service_key.clone(),
        limit,
      )?),
      gateway: Arc::new(StripeGateway::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
        limit,
      )?),
      notifier,
    })
  }
}

#[derive(Clone)]
pub struct AppState {
  pub sagas: Arc<SagaRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub orders: Arc<dyn OrderStore>,
  pub catalog: Arc<dyn Catalog>,
  pub identity: Arc<dyn IdentityVerifier>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
  /// Builds the state and registers every saga against it.
  pub fn new(config: Arc<AppConfig>, collaborators: Collaborators) -> Self {
    let sagas = Arc::new(SagaRegistry::<AppError>::new());
    pipelines::register_all_sagas(&sagas, &config);
    Self {
      sagas,
      config,
      orders: collaborators.orders,
      catalog: collaborators.catalog,
      identity: collaborators.identity,
      gateway: collaborators.gateway,
      notifier: collaborators.notifier,
    }
  }
}
