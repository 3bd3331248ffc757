// storefront-saga/src/core/hook.rs

use crate::core::context::StepContext;
use crate::core::control::Flow;
use std::future::Future;
use std::pin::Pin;

/// Boxed future produced by a hook.
pub type HookFuture<Err> = Pin<Box<dyn Future<Output = Result<Flow, Err>> + Send>>;

/// A type-erased step hook.
///
/// Hooks receive their own clone of the run's `StepContext` and must release
/// any lock guard before awaiting.
pub type Hook<TData, Err> = Box<dyn Fn(StepContext<TData>) -> HookFuture<Err> + Send + Sync>;
