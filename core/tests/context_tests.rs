// tests/context_tests.rs
mod common;

use common::*;
use saga::StepContext;

#[test]
fn clones_share_the_same_data() {
  let ctx = StepContext::new(TestContext::default());
  let other = ctx.clone();
  other.write().counter = 7;
  assert_eq!(ctx.read().counter, 7);
}

#[test]
fn with_and_update_hold_short_locks() {
  let ctx = StepContext::new(TestContext::default());
  let len = ctx.update(|data| {
    data.message.push_str("hello");
    data.message.len()
  });
  assert_eq!(len, 5);
  assert_eq!(ctx.with(|data| data.message.clone()), "hello");
  assert!(ctx.try_write().is_some());
}

#[test]
fn try_write_fails_while_read_guard_is_held() {
  let ctx = StepContext::new(TestContext::default());
  let guard = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(guard);
  assert!(ctx.try_write().is_some());
}

#[test]
fn default_wraps_default_data() {
  let ctx: StepContext<TestContext> = StepContext::default();
  assert_eq!(ctx.read().counter, 0);
}
