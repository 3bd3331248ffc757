// storefront-saga/src/saga/mod.rs

//! The `Saga<TData, E>` type: construction, hook registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Saga;
