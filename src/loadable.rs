//! Fetch lifecycle for remote resources.
//!
//! A [`Loadable`] records whether a resource has never been requested, is in
//! flight, or has resolved to an [`ApiResult`]. The `is_dirty` flag is
//! orthogonal to the state and marks a cached value as possibly stale.
//!
//! ```ignore
//! let text = handle_loadable(
//!   &story,
//!   || "Loading...".to_string(),
//!   |info| info.title.clone(),
//!   |err| format!("Error: {}", err),
//! );
//! ```

use crate::api::{ApiError, ApiResult};

/// Where a resource is in its fetch lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<T> {
  /// Never requested
  #[default]
  NotLoaded,
  /// Request in flight
  Loading,
  /// Request resolved
  Loaded(ApiResult<T>),
}

/// A resource's fetch state plus the staleness flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loadable<T> {
  pub state: LoadState<T>,
  pub is_dirty: bool,
}

impl<T> Default for Loadable<T> {
  fn default() -> Self {
    Self {
      state: LoadState::NotLoaded,
      is_dirty: false,
    }
  }
}

impl<T> Loadable<T> {
  pub fn not_loaded() -> Self {
    Self::default()
  }

  pub fn loading() -> Self {
    Self {
      state: LoadState::Loading,
      is_dirty: false,
    }
  }

  pub fn loaded(result: ApiResult<T>) -> Self {
    Self {
      state: LoadState::Loaded(result),
      is_dirty: false,
    }
  }

  pub fn ok(value: T) -> Self {
    Self::loaded(Ok(value))
  }

  pub fn err(error: ApiError) -> Self {
    Self::loaded(Err(error))
  }

  pub fn is_loaded_and_success(&self) -> bool {
    matches!(self.state, LoadState::Loaded(Ok(_)))
  }

  /// The successful value, if any.
  pub fn value(&self) -> Option<&T> {
    match &self.state {
      LoadState::Loaded(Ok(value)) => Some(value),
      _ => None,
    }
  }

  /// The failure, if the load resolved to an error.
  pub fn error(&self) -> Option<&ApiError> {
    match &self.state {
      LoadState::Loaded(Err(error)) => Some(error),
      _ => None,
    }
  }
}

#[cfg(test)]
impl<T> Loadable<T> {
  /// Same state with the dirty flag replaced.
  pub fn with_dirty(mut self, is_dirty: bool) -> Self {
    self.is_dirty = is_dirty;
    self
  }

  pub fn is_not_loaded(&self) -> bool {
    matches!(self.state, LoadState::NotLoaded)
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, LoadState::Loading)
  }
}

pub fn not_loaded<T>() -> Loadable<T> {
  Loadable::not_loaded()
}

/// True iff the loadable resolved successfully. Gates reads of cached values.
pub fn is_loaded_and_success<T>(loadable: &Loadable<T>) -> bool {
  loadable.is_loaded_and_success()
}

/// Dispatch a result to exactly one of the two branches.
pub fn handle_result<'a, T, K>(
  result: &'a ApiResult<T>,
  ok_fn: impl FnOnce(&'a T) -> K,
  err_fn: impl FnOnce(&'a ApiError) -> K,
) -> K {
  match result {
    Ok(value) => ok_fn(value),
    Err(error) => err_fn(error),
  }
}

/// Dispatch a loadable to exactly one branch.
///
/// `NotLoaded` and `Loading` both go to `loading_fn`. Match on
/// [`Loadable::state`] directly when the two need to be told apart.
pub fn handle_loadable<'a, T, K>(
  loadable: &'a Loadable<T>,
  loading_fn: impl FnOnce() -> K,
  ok_fn: impl FnOnce(&'a T) -> K,
  err_fn: impl FnOnce(&'a ApiError) -> K,
) -> K {
  match &loadable.state {
    LoadState::NotLoaded | LoadState::Loading => loading_fn(),
    LoadState::Loaded(result) => handle_result(result, ok_fn, err_fn),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn describe(loadable: &Loadable<u32>) -> String {
    handle_loadable(
      loadable,
      || "loading".to_string(),
      |v| format!("ok {}", v),
      |e| format!("err {}", e),
    )
  }

  #[test]
  fn test_not_loaded_is_default() {
    let l: Loadable<u32> = not_loaded();
    assert!(l.is_not_loaded());
    assert!(!l.is_dirty);
    assert_eq!(l, Loadable::default());
  }

  #[test]
  fn test_only_ok_counts_as_success() {
    assert!(!is_loaded_and_success(&Loadable::<u32>::not_loaded()));
    assert!(!is_loaded_and_success(&Loadable::<u32>::loading()));
    assert!(!is_loaded_and_success(&Loadable::<u32>::err(
      ApiError::not_found("page 1")
    )));
    assert!(is_loaded_and_success(&Loadable::ok(1u32)));
  }

  #[test]
  fn test_handle_loadable_conflates_pending_states() {
    assert_eq!(describe(&Loadable::not_loaded()), "loading");
    assert_eq!(describe(&Loadable::loading()), "loading");
    assert_eq!(describe(&Loadable::ok(3)), "ok 3");
    assert_eq!(
      describe(&Loadable::err(ApiError::not_found("story 7 not found"))),
      "err story 7 not found"
    );
  }

  #[test]
  fn test_handle_result_dispatches_once() {
    let ok: ApiResult<u32> = Ok(2);
    let err: ApiResult<u32> = Err(ApiError::storage("disk full"));
    assert_eq!(handle_result(&ok, |v| *v * 10, |_| 0), 20);
    assert_eq!(handle_result(&err, |v| *v, |e| e.message.len() as u32), 9);
  }

  #[test]
  fn test_dirty_flag_is_independent_of_state() {
    let l = Loadable::ok(5u32).with_dirty(true);
    assert!(l.is_dirty);
    assert!(l.is_loaded_and_success());
    assert_eq!(l.value(), Some(&5));

    let pending = Loadable::<u32>::loading().with_dirty(true);
    assert!(pending.is_dirty);
    assert!(pending.is_loading());
  }

  #[test]
  fn test_accessors() {
    let e = Loadable::<u32>::err(ApiError::invalid_input("empty name"));
    assert_eq!(e.value(), None);
    assert_eq!(e.error().map(|e| e.message.as_str()), Some("empty name"));
  }
}
