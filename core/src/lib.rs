// storefront-saga/src/lib.rs

//! An async saga engine for ordered, multi-step business processes.
//!
//! A `Saga<TData, E>` is a list of named steps. Each step carries `before`,
//! `on` and `after` hooks that share one `StepContext<TData>`. Hooks either
//! continue, halt the run early, or fail it with `E`. Steps may be optional
//! and may carry a timeout that bounds every hook they run.
//!
//! A `SagaRegistry<AppErr>` keeps one saga per context type so that request
//! handlers can run "the checkout saga" by constructing its context.
//!
//! Typical wiring:
//!  1. Define a context struct for the process.
//!  2. Build a `Saga` from a list of `StepSpec`s and attach hooks with `.on(...)`.
//!  3. Register it with a `SagaRegistry` at startup.
//!  4. Per request, wrap a fresh context in `StepContext::new` and call `registry.run(ctx.clone())`.

pub mod core;
pub mod error;
pub mod registry;
pub mod saga;

pub use crate::core::context::StepContext;
pub use crate::core::control::{Flow, Outcome};
pub use crate::core::hook::{Hook, HookFuture};
pub use crate::core::step::StepSpec;

pub use crate::saga::definition::Saga;

pub use crate::error::{SagaError, SagaResult};

pub use crate::registry::SagaRegistry;
