// storefront-saga/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by the saga engine itself.
///
/// Application sagas pick their own error type `Err`, which must be
/// constructible from `SagaError` so engine failures (a step that timed out,
/// a mandatory step nobody wired a hook into) surface through the same channel
/// as business errors.
#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("No hook registered for mandatory step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Step '{step_name}' did not finish within {timeout:?}")]
  StepTimedOut { step_name: String, timeout: Duration },

  #[error("Context type mismatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("No saga registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Hook failed: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal saga error: {0}")]
  Internal(String),
}

impl SagaError {
  /// True when the failure came from a bounded step running out of time.
  pub fn is_timeout(&self) -> bool {
    matches!(self, SagaError::StepTimedOut { .. })
  }
}

impl From<AnyhowError> for SagaError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap rather than nest when the anyhow error already carries a SagaError.
    match err.downcast::<SagaError>() {
      Ok(saga_err) => saga_err,
      Err(other) => SagaError::HandlerError { source: other },
    }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;
