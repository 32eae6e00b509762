//! Caching Proxy - A memoizing cache in front of async fetch functions
//!
//! Deduplicates lookups by normalized key, expires entries by age or by
//! inactivity, and bounds the entry count with oldest-first eviction.

pub mod cache;
pub mod config;
pub mod error;
pub mod timer;

pub use cache::{CacheStats, CachingProxy, FetchItem, KeyNormalizer, StableJsonKey};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use timer::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
