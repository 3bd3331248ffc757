// storefront-saga/src/saga/definition.rs

use crate::core::hook::Hook;
use crate::core::step::StepSpec;
use crate::error::SagaError;
use std::collections::HashMap;
use std::time::Duration;

/// An ordered list of named steps over a shared context `TData`.
///
/// Each step owns three hook lists that run in order: `before`, `on`, `after`.
/// `E` is what hooks fail with; it must absorb engine failures (`From<SagaError>`).
pub struct Saga<TData, E>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepSpec>,
  pub(crate) before: HashMap<String, Vec<Hook<TData, E>>>,
  pub(crate) on: HashMap<String, Vec<Hook<TData, E>>>,
  pub(crate) after: HashMap<String, Vec<Hook<TData, E>>>,
}

impl<TData, E> Saga<TData, E>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Panics on duplicate step names.
  pub fn new(specs: &[StepSpec]) -> Self {
    let mut saga = Self {
      steps: Vec::with_capacity(specs.len()),
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    };
    for spec in specs {
      saga.ensure_step_not_exists(&spec.name);
      saga.steps.push(spec.clone());
    }
    saga
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn spec(&self, step_name: &str) -> Option<&StepSpec> {
    self.steps.iter().find(|s| s.name == step_name)
  }

  // Unknown step names are wiring mistakes, caught the first time the saga is built.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if self.spec(step_name).is_none() {
      panic!("Saga setup error: step '{}' is not declared.", step_name);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.spec(step_name).is_some() {
      panic!("Saga setup error: step '{}' is declared twice.", step_name);
    }
  }

  fn position(&self, step_name: &str) -> usize {
    self.ensure_step_exists(step_name);
    self.steps.iter().position(|s| s.name == step_name).unwrap_or_default()
  }

  pub fn insert_before(&mut self, existing_step: &str, spec: StepSpec) {
    let idx = self.position(existing_step);
    self.ensure_step_not_exists(&spec.name);
    self.steps.insert(idx, spec);
  }

  pub fn insert_after(&mut self, existing_step: &str, spec: StepSpec) {
    let idx = self.position(existing_step);
    self.ensure_step_not_exists(&spec.name);
    self.steps.insert(idx + 1, spec);
  }

  /// Removes the step and every hook attached to it. Unknown names are ignored.
  pub fn remove_step(&mut self, step_name: &str) {
    self.steps.retain(|s| s.name != step_name);
    self.before.remove(step_name);
    self.on.remove(step_name);
    self.after.remove(step_name);
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    let idx = self.position(step_name);
    self.steps[idx].optional = optional;
  }

  pub fn set_timeout(&mut self, step_name: &str, timeout: Option<Duration>) {
    let idx = self.position(step_name);
    self.steps[idx].timeout = timeout;
  }

  /// Returns `Err(SagaError::StepNotFound)` instead of panicking, for callers
  /// that reconfigure sagas from runtime input.
  pub fn try_set_timeout(&mut self, step_name: &str, timeout: Option<Duration>) -> Result<(), SagaError> {
    match self.steps.iter_mut().find(|s| s.name == step_name) {
      Some(spec) => {
        spec.timeout = timeout;
        Ok(())
      }
      None => Err(SagaError::StepNotFound {
        step_name: step_name.to_string(),
      }),
    }
  }
}
