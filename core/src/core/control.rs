// storefront-saga/src/core/control.rs

//! Signals for steering a saga run and the outcome of a finished run.

/// Returned by every hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  /// Proceed to the next hook, then to the next step.
  Continue,
  /// Stop the run here. No later hook of this or any following step runs.
  Halt,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// Every step ran.
  Completed,
  /// A hook returned `Flow::Halt`.
  Halted,
}
