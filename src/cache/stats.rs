//! Cache Statistics Module
//!
//! Tracks hits, fetches, evictions and timer-driven expirations.

use serde::Serialize;

use crate::cache::ExpiryKind;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls served without invoking the fetch function
    pub hits: u64,
    /// Number of `get` calls that invoked the fetch function
    pub misses: u64,
    /// Number of entries removed to stay within `max_count`
    pub evictions: u64,
    /// Number of entries removed by their stale timer
    pub stale_expirations: u64,
    /// Number of entries removed by their idle timer
    pub idle_expirations: u64,
    /// Number of fetches that returned an error
    pub fetch_failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no `get` has been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    // == Record Expiration ==
    /// Increments the counter for the timer that fired.
    pub fn record_expiration(&mut self, kind: ExpiryKind) {
        match kind {
            ExpiryKind::Stale => self.stale_expirations += 1,
            ExpiryKind::Idle => self.idle_expirations += 1,
        }
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_expiration_by_kind() {
        let mut stats = CacheStats::new();
        stats.record_expiration(ExpiryKind::Stale);
        stats.record_expiration(ExpiryKind::Idle);
        stats.record_expiration(ExpiryKind::Idle);

        assert_eq!(stats.stale_expirations, 1);
        assert_eq!(stats.idle_expirations, 2);
    }

    #[test]
    fn test_serializes_counters() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_fetch_failure();
        stats.set_total_entries(4);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["fetch_failures"], 1);
        assert_eq!(json["total_entries"], 4);
    }
}
