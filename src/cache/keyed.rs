//! Keyed cache of [`Loadable`] resources.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::observer::{Observers, Subscription};
use crate::loadable::Loadable;

/// What a mutating call changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheChange<K> {
  Set(K),
  SetMany(Vec<K>),
  /// Entries removed and entries written by one [`KeyedResourceCache::replace_where`]
  Replaced {
    removed: Vec<K>,
    set: Vec<K>,
  },
  Dirty(K),
  Deleted(K),
  Cleared,
}

/// Mapping from resource key to its fetch state.
///
/// Absent keys read as NotLoaded. Entries are kept ordered by key so
/// [`entries`](Self::entries) is stable for display. Clones share the same
/// entries and observers.
pub struct KeyedResourceCache<K, V> {
  entries: Arc<Mutex<BTreeMap<K, Loadable<V>>>>,
  observers: Observers<CacheChange<K>>,
}

impl<K, V> KeyedResourceCache<K, V>
where
  K: Ord + Clone + 'static,
  V: Clone,
{
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(BTreeMap::new())),
      observers: Observers::new(),
    }
  }

  fn lock(&self) -> MutexGuard<'_, BTreeMap<K, Loadable<V>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current state for `key`. Never triggers a fetch.
  pub fn get(&self, key: &K) -> Loadable<V> {
    self.lock().get(key).cloned().unwrap_or_default()
  }

  /// Replace the entry at `key`. Notifies once per call, changed or not.
  pub fn set(&self, key: K, value: Loadable<V>) {
    self.lock().insert(key.clone(), value);
    self.observers.notify(&CacheChange::Set(key));
  }

  /// Remove every entry matching `remove`, then write `items`, under one lock.
  ///
  /// Observers are notified once, after both steps, and only if something was
  /// removed or written. No observer sees the removals without the writes.
  pub fn replace_where(
    &self,
    remove: impl Fn(&K, &Loadable<V>) -> bool,
    items: impl IntoIterator<Item = (K, Loadable<V>)>,
  ) {
    let change = {
      let mut entries = self.lock();
      let removed: Vec<K> = entries
        .iter()
        .filter(|(key, value)| remove(key, value))
        .map(|(key, _)| key.clone())
        .collect();
      for key in &removed {
        entries.remove(key);
      }

      let set: Vec<K> = items
        .into_iter()
        .map(|(key, value)| {
          entries.insert(key.clone(), value);
          key
        })
        .collect();

      (!removed.is_empty() || !set.is_empty()).then_some(CacheChange::Replaced { removed, set })
    };

    if let Some(change) = change {
      self.observers.notify(&change);
    }
  }

  /// Flag an existing entry as stale. Returns false if `key` is absent.
  pub fn mark_dirty(&self, key: &K) -> bool {
    let marked = match self.lock().get_mut(key) {
      Some(entry) => {
        entry.is_dirty = true;
        true
      }
      None => false,
    };

    if marked {
      self.observers.notify(&CacheChange::Dirty(key.clone()));
    }
    marked
  }

  /// Ordered snapshot of every entry.
  pub fn entries(&self) -> Vec<(K, Loadable<V>)> {
    self
      .lock()
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect()
  }

  pub fn subscribe(
    &self,
    callback: impl Fn(&CacheChange<K>) + Send + Sync + 'static,
  ) -> Subscription {
    self.observers.subscribe(callback)
  }
}

// Part of the cache's surface; the story controller only needs the
// operations above.
#[allow(dead_code)]
impl<K, V> KeyedResourceCache<K, V>
where
  K: Ord + Clone + 'static,
  V: Clone,
{
  pub fn has(&self, key: &K) -> bool {
    self.lock().contains_key(key)
  }

  /// Replace several entries in one step with a single notification.
  pub fn set_many(&self, items: impl IntoIterator<Item = (K, Loadable<V>)>) {
    let keys: Vec<K> = {
      let mut entries = self.lock();
      items
        .into_iter()
        .map(|(key, value)| {
          entries.insert(key.clone(), value);
          key
        })
        .collect()
    };
    self.observers.notify(&CacheChange::SetMany(keys));
  }

  /// Remove `key`. Notifies only if an entry was removed.
  pub fn delete(&self, key: &K) -> bool {
    let removed = self.lock().remove(key).is_some();
    if removed {
      self.observers.notify(&CacheChange::Deleted(key.clone()));
    }
    removed
  }

  /// Remove every entry. Notifies only if the cache was not already empty.
  pub fn clear(&self) {
    let had_entries = {
      let mut entries = self.lock();
      let had_entries = !entries.is_empty();
      entries.clear();
      had_entries
    };
    if had_entries {
      self.observers.notify(&CacheChange::Cleared);
    }
  }

  pub fn keys(&self) -> Vec<K> {
    self.lock().keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }
}

impl<K, V> Default for KeyedResourceCache<K, V>
where
  K: Ord + Clone + 'static,
  V: Clone,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V> Clone for KeyedResourceCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
      observers: self.observers.clone(),
    }
  }
}
