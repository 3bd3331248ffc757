// tests/common/mod.rs
#![allow(dead_code)]

use saga::{Flow, Hook, SagaError, StepContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_halt_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  // SagaError is not PartialEq, keep its Debug form for assertions.
  #[error("Saga engine error: {0}")]
  Saga(String),

  #[error("Test hook failed: {0}")]
  Hook(String),
}

impl From<SagaError> for TestError {
  fn from(err: SagaError) -> Self {
    TestError::Saga(format!("{:?}", err))
  }
}

pub fn recording_hook(step_name: &'static str, message_to_append: &'static str) -> Hook<TestContext, TestError> {
  Box::new(move |ctx: StepContext<TestContext>| {
    Box::pin(async move {
      let halt = ctx.update(|data| {
        data.counter += 1;
        data.message.push_str(message_to_append);
        data.steps_executed.push(step_name.to_string());
        data.should_halt_at.as_deref() == Some(step_name)
      });
      tracing::debug!(target: "test_hooks", step = step_name, "executed");
      Ok(if halt { Flow::Halt } else { Flow::Continue })
    })
  })
}

pub fn failing_hook(step_name: &'static str, error_message: &'static str) -> Hook<TestContext, TestError> {
  Box::new(move |ctx: StepContext<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Hook(error_message.to_string()))
    })
  })
}

pub fn sleeping_hook(step_name: &'static str, nap: Duration) -> Hook<TestContext, TestError> {
  Box::new(move |ctx: StepContext<TestContext>| {
    Box::pin(async move {
      tokio::time::sleep(nap).await;
      ctx.write().steps_executed.push(step_name.to_string());
      Ok(Flow::Continue)
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub static HOOK_EXEC_COUNTER: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(0));

pub fn reset_counters() {
  HOOK_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
