// merch-flow/src/core/context_data.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state that every step of a flow run operates on.
///
/// Guards are blocking `parking_lot` guards and MUST be dropped before any
/// `.await` point inside a handler.
#[derive(Debug)]
pub struct FlowContext<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> FlowContext<T> {
  pub fn new(data: T) -> Self {
    FlowContext(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }
}

impl<T: Send + Sync + 'static> Clone for FlowContext<T> {
  fn clone(&self) -> Self {
    FlowContext(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for FlowContext<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
