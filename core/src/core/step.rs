// storefront-saga/src/core/step.rs

use std::time::Duration;

/// Declaration of one saga step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
  pub name: String,
  /// An optional step with no hooks is skipped instead of failing the run.
  pub optional: bool,
  /// Upper bound for each hook invocation of this step.
  pub timeout: Option<Duration>,
}

impl StepSpec {
  pub fn step(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
      timeout: None,
    }
  }

  pub fn optional_step(name: impl Into<String>) -> Self {
    Self {
      optional: true,
      ..Self::step(name)
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Applies `timeout` only when one is given; handy when the bound comes from config.
  pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }
}
