use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
  next_id: u64,
  callbacks: Vec<(u64, Callback<E>)>,
}

/// Registry of change callbacks.
///
/// Callbacks run synchronously, in subscription order, on the thread that
/// performed the mutation.
pub struct Observers<E> {
  registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> Observers<E> {
  pub fn new() -> Self {
    Self {
      registry: Arc::new(Mutex::new(Registry {
        next_id: 0,
        callbacks: Vec::new(),
      })),
    }
  }

  /// Register a callback. It stays registered until the returned
  /// [`Subscription`] is dropped.
  pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
    let id = {
      let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
      let id = registry.next_id;
      registry.next_id += 1;
      registry.callbacks.push((id, Arc::new(callback)));
      id
    };

    let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
    Subscription {
      unsubscribe: Some(Box::new(move || {
        if let Some(registry) = weak.upgrade() {
          // The callback is dropped after the lock is released; it may own subscriptions
          let removed = {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
              .callbacks
              .iter()
              .position(|(cb_id, _)| *cb_id == id)
              .map(|index| registry.callbacks.remove(index))
          };
          drop(removed);
        }
      })),
    }
  }

  /// Call every registered callback with `event`.
  pub fn notify(&self, event: &E) {
    // Snapshot so callbacks can subscribe or unsubscribe without deadlocking
    let callbacks: Vec<Callback<E>> = {
      let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
      registry.callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    };

    for callback in callbacks {
      callback(event);
    }
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self
      .registry
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .callbacks
      .len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<E: 'static> Default for Observers<E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> Clone for Observers<E> {
  fn clone(&self) -> Self {
    Self {
      registry: Arc::clone(&self.registry),
    }
  }
}

/// Handle for a registered callback. Dropping it unregisters the callback.
#[must_use = "dropping a Subscription unregisters its callback immediately"]
pub struct Subscription {
  unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(unsubscribe) = self.unsubscribe.take() {
      unsubscribe();
    }
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("active", &self.unsubscribe.is_some())
      .finish()
  }
}
