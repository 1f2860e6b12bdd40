use std::sync::{Arc, Mutex, PoisonError};

use super::observer::{Observers, Subscription};
use crate::loadable::{not_loaded, Loadable};

/// A single observed resource.
pub struct ResourceSlot<T> {
  value: Arc<Mutex<Loadable<T>>>,
  observers: Observers<()>,
}

impl<T: Clone> ResourceSlot<T> {
  pub fn new() -> Self {
    Self {
      value: Arc::new(Mutex::new(not_loaded())),
      observers: Observers::new(),
    }
  }

  /// Snapshot of the current state.
  pub fn get(&self) -> Loadable<T> {
    self
      .value
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Replace the state and notify observers once.
  pub fn set(&self, value: Loadable<T>) {
    *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    self.observers.notify(&());
  }

  pub fn subscribe(&self, callback: impl Fn(&()) + Send + Sync + 'static) -> Subscription {
    self.observers.subscribe(callback)
  }
}

impl<T: Clone> Default for ResourceSlot<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for ResourceSlot<T> {
  fn clone(&self) -> Self {
    Self {
      value: Arc::clone(&self.value),
      observers: self.observers.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn test_starts_not_loaded() {
    let slot: ResourceSlot<String> = ResourceSlot::new();
    assert!(slot.get().is_not_loaded());
  }

  #[test]
  fn test_set_notifies_even_when_unchanged() {
    let slot: ResourceSlot<u8> = ResourceSlot::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let _sub = slot.subscribe(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });

    slot.set(Loadable::ok(1));
    slot.set(Loadable::ok(1));
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(slot.get(), Loadable::ok(1));
  }

  #[test]
  fn test_clones_share_state() {
    let slot: ResourceSlot<u8> = ResourceSlot::new();
    let other = slot.clone();
    other.set(Loadable::loading());
    assert!(slot.get().is_loading());
  }
}
