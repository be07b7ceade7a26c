//! In-memory entity cache with lazily expiring TTL entries.
//!
//! One [`CategoryStore`] per entity category, owned by a
//! [`CacheCoordinator`] that serializes every mutation behind a single
//! write guard.

pub mod coordinator;
pub mod entry;
pub mod store;

pub use coordinator::CacheCoordinator;
pub use entry::CacheEntry;
pub use store::{CategoryStore, Lookup};
