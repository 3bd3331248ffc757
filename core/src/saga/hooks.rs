// storefront-saga/src/saga/hooks.rs

//! Registration of `before`, `on` and `after` hooks.
//!
//! A hook is any `Fn(StepContext<TData>) -> impl Future<Output = Result<Flow, UserErr>>`
//! where `UserErr: Into<E>`; the closure is boxed and its error converted on the way out.

use crate::core::context::StepContext;
use crate::core::control::Flow;
use crate::core::hook::Hook;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use std::collections::HashMap;
use std::future::Future;

fn boxed<TData, E, F, UserErr>(hook_fn: impl Fn(StepContext<TData>) -> F + Send + Sync + 'static) -> Hook<TData, E>
where
  TData: 'static + Send + Sync,
  E: 'static,
  F: Future<Output = Result<Flow, UserErr>> + Send + 'static,
  UserErr: Into<E> + Send + Sync + 'static,
{
  Box::new(move |ctx| {
    let fut = hook_fn(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}

fn push<TData: Send + Sync + 'static, E>(table: &mut HashMap<String, Vec<Hook<TData, E>>>, step_name: &str, hook: Hook<TData, E>) {
  table.entry(step_name.to_string()).or_default().push(hook);
}

impl<TData, E> Saga<TData, E>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub fn before<F, UserErr>(
    &mut self,
    step_name: &str,
    hook_fn: impl Fn(StepContext<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<Flow, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.before, step_name, boxed(hook_fn));
  }

  pub fn on<F, UserErr>(&mut self, step_name: &str, hook_fn: impl Fn(StepContext<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Flow, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.on, step_name, boxed(hook_fn));
  }

  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    hook_fn: impl Fn(StepContext<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<Flow, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.after, step_name, boxed(hook_fn));
  }

  /// Number of hooks attached to a step across all phases.
  pub fn hook_count(&self, step_name: &str) -> usize {
    [&self.before, &self.on, &self.after]
      .iter()
      .map(|table| table.get(step_name).map_or(0, Vec::len))
      .sum()
  }
}
