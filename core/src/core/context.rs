// storefront-saga/src/core/context.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared state threaded through every hook of a saga run.
///
/// Cloning is cheap (an `Arc` bump) and every clone observes the same data.
/// Guards are blocking and MUST be dropped before any `.await`.
#[derive(Debug)]
pub struct StepContext<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> StepContext<T> {
  pub fn new(data: T) -> Self {
    StepContext(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
    self.0.try_read()
  }

  pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
    self.0.try_write()
  }

  /// Copies a value out under a short read lock.
  pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    f(&self.0.read())
  }

  /// Mutates under a short write lock.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    f(&mut self.0.write())
  }
}

impl<T: Send + Sync + 'static> Clone for StepContext<T> {
  fn clone(&self) -> Self {
    StepContext(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for StepContext<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
