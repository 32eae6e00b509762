//! Cache Module
//!
//! Memoizing cache with stale and idle expiry timers and oldest-first
//! eviction.

mod entry;
mod key;
mod order;
mod proxy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, ExpiryKind};
pub use key::{normalize_key, KeyNormalizer, StableJsonKey};
pub use order::CreationOrder;
pub use proxy::{CachingProxy, FetchItem};
pub use stats::CacheStats;
pub use store::{CacheStore, SharedStore};

use std::time::Duration;

// == Public Constants ==
/// Default absolute lifetime of an entry (24 hours)
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default idle lifetime of an entry (24 hours)
pub const DEFAULT_UNUSED_TIME: Duration = Duration::from_secs(24 * 60 * 60);
