//! In-memory resource cache with synchronous change notification.
//!
//! This module provides:
//! - [`ResourceSlot`]: one observed [`Loadable`](crate::loadable::Loadable)
//! - [`KeyedResourceCache`]: an ordered `key -> Loadable` map
//! - [`Observers`] / [`Subscription`]: the callback registry both use
//!
//! Every mutating call notifies observers after its lock is released, so an
//! observer may read the cache from inside its callback.

mod keyed;
mod observer;
mod slot;

pub use keyed::KeyedResourceCache;
pub use observer::Subscription;
pub use slot::ResourceSlot;
