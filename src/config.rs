//! Configuration Module
//!
//! Handles cache configuration, either built in code or loaded from
//! environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_STALE_TIME, DEFAULT_UNUSED_TIME};

/// Cache configuration parameters.
///
/// Every value has a default; `CacheConfig::default()` gives an unbounded
/// cache whose entries live for at most 24 hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries, `None` = unbounded
    pub max_count: Option<usize>,
    /// Absolute lifetime of an entry, measured from its last `set`
    pub stale_time: Duration,
    /// Idle lifetime of an entry, measured from its last read
    pub unused_time: Duration,
    /// Collapse concurrent misses for the same key into one fetch
    pub dedupe_misses: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_COUNT` - Maximum cache entries (default: unbounded)
    /// - `CACHE_STALE_TIME_MS` - Absolute lifetime in milliseconds (default: 24h)
    /// - `CACHE_UNUSED_TIME_MS` - Idle lifetime in milliseconds (default: 24h)
    /// - `CACHE_DEDUPE_MISSES` - `true`/`false` (default: false)
    pub fn from_env() -> Self {
        Self {
            max_count: env::var("CACHE_MAX_COUNT")
                .ok()
                .and_then(|v| v.parse().ok()),
            stale_time: env::var("CACHE_STALE_TIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_STALE_TIME),
            unused_time: env::var("CACHE_UNUSED_TIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_UNUSED_TIME),
            dedupe_misses: env::var("CACHE_DEDUPE_MISSES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Bounds the cache to `max_count` entries.
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_unused_time(mut self, unused_time: Duration) -> Self {
        self.unused_time = unused_time;
        self
    }

    pub fn with_dedupe_misses(mut self, dedupe_misses: bool) -> Self {
        self.dedupe_misses = dedupe_misses;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_count: None,
            stale_time: DEFAULT_STALE_TIME,
            unused_time: DEFAULT_UNUSED_TIME,
            dedupe_misses: false,
        }
    }
}
