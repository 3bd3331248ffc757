// storefront-saga/src/registry.rs

//! `SagaRegistry<AppErr>`: sagas keyed by the type of context they run over.
//!
//! Each context type has at most one saga. Callers hand the registry a
//! `StepContext<TData>` and the saga registered for `TData` is run against it.

use crate::core::context::StepContext;
use crate::core::control::Outcome;
use crate::error::SagaError;
use crate::saga::definition::Saga;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[async_trait]
trait ErasedSaga<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx` must box a `StepContext<TData>` for the wrapped saga's `TData`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr>;
}

struct RegisteredSaga<TData, E, AppErr>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  saga: Arc<Saga<TData, E>>,
  _marker: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, E, AppErr> ErasedSaga<AppErr> for RegisteredSaga<TData, E, AppErr>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<E> + From<SagaError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, AppErr> {
    let ctx = match ctx.downcast::<StepContext<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<StepContext<TData>>().to_string();
        error!(%expected_type, "Context type mismatch in registry dispatch.");
        return Err(AppErr::from(SagaError::TypeMismatch { expected_type }));
      }
    };
    self.saga.run(ctx).await.map_err(AppErr::from)
  }
}

/// Holds one saga per context type and dispatches runs to it.
///
/// `AppErr` is what `run` fails with. It absorbs both registry failures
/// (`SagaError::NotRegistered`) and the error type of every registered saga.
pub struct SagaRegistry<AppErr = SagaError>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  sagas: RwLock<HashMap<TypeId, Arc<dyn ErasedSaga<AppErr>>>>,
}

impl<AppErr> SagaRegistry<AppErr>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      sagas: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `saga` for context type `TData`, replacing any earlier one.
  pub fn register<TData, E>(&self, saga: Saga<TData, E>)
  where
    TData: 'static + Send + Sync,
    E: std::error::Error + From<SagaError> + Send + Sync + 'static,
    AppErr: From<E>,
  {
    debug!(
      context_type = %std::any::type_name::<TData>(),
      steps = ?saga.step_names(),
      "Registering saga."
    );
    let entry: Arc<dyn ErasedSaga<AppErr>> = Arc::new(RegisteredSaga::<TData, E, AppErr> {
      saga: Arc::new(saga),
      _marker: PhantomData,
    });
    self.sagas.write().insert(TypeId::of::<TData>(), entry);
  }

  pub fn contains<TData: 'static>(&self) -> bool {
    self.sagas.read().contains_key(&TypeId::of::<TData>())
  }

  pub fn len(&self) -> usize {
    self.sagas.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.sagas.read().is_empty()
  }

  /// Runs the saga registered for `TData` against `ctx`.
  ///
  /// The caller keeps its own clone of `ctx` to read results after the run.
  #[instrument(
    name = "SagaRegistry::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>()),
    err(Display)
  )]
  pub async fn run<TData>(&self, ctx: StepContext<TData>) -> Result<Outcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    // Clone the Arc out so the lock is released before awaiting.
    let runner = self.sagas.read().get(&TypeId::of::<TData>()).cloned();
    let Some(runner) = runner else {
      let type_name = std::any::type_name::<TData>().to_string();
      error!(%type_name, "No saga registered for context type.");
      return Err(AppErr::from(SagaError::NotRegistered { type_name }));
    };
    runner.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for SagaRegistry<AppErr>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
