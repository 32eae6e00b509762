//! Cache Store Module
//!
//! Main cache engine: keyed storage, expiry timers and oldest-first eviction.
//! Every removal, whatever its trigger, goes through `remove_entry`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::entry::ArmedTimer;
use crate::cache::{CacheEntry, CacheStats, CreationOrder, ExpiryKind};
use crate::config::CacheConfig;
use crate::timer::Scheduler;

/// A store shared between its owner and its timer callbacks.
pub type SharedStore<V> = Arc<Mutex<CacheStore<V>>>;

// == Cache Store ==
/// Cache storage keyed by normalized key.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Creation order for eviction
    order: CreationOrder,
    /// Activity counters
    stats: CacheStats,
    /// Expiry and capacity settings
    config: CacheConfig,
    /// Timer facility used to arm expiry timers
    scheduler: Arc<dyn Scheduler>,
    /// Back-reference handed to timer callbacks
    this: Weak<Mutex<CacheStore<V>>>,
    next_seq: u64,
    next_timer_id: u64,
}

impl<V: Clone + Send + 'static> CacheStore<V> {
    // == Constructor ==
    /// Creates a shared store that arms its timers on `scheduler`.
    ///
    /// Timer callbacks only hold a weak reference, so dropping the last
    /// `SharedStore` drops every entry and cancels every pending timer.
    pub fn shared(config: CacheConfig, scheduler: Arc<dyn Scheduler>) -> SharedStore<V> {
        Arc::new_cyclic(|this| {
            Mutex::new(Self {
                entries: HashMap::new(),
                order: CreationOrder::new(),
                stats: CacheStats::new(),
                config,
                scheduler,
                this: this.clone(),
                next_seq: 0,
                next_timer_id: 0,
            })
        })
    }

    // == Insert ==
    /// Creates or overwrites the entry for `key`.
    ///
    /// Overwriting resets the creation time and both timers. If the entry
    /// count then exceeds `max_count`, the oldest-created entry is evicted.
    pub fn insert(&mut self, key: String, value: V) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let stale_timer = self.arm(&key, ExpiryKind::Stale);
        let idle_timer = self.arm(&key, ExpiryKind::Idle);
        let entry = CacheEntry::new(value, seq, stale_timer, idle_timer);

        // The replaced entry drops here, cancelling its timers
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.order.remove(previous.seq);
        }
        self.order.record(seq, &key);

        if let Some(max_count) = self.config.max_count {
            if self.entries.len() > max_count {
                self.evict_oldest();
            }
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Lookup ==
    /// Returns the cached value for `key`, counting a hit and restarting the
    /// idle timer. The stale timer is left alone.
    pub fn lookup(&mut self, key: &str) -> Option<V> {
        if !self.entries.contains_key(key) {
            return None;
        }

        let idle_timer = self.arm(key, ExpiryKind::Idle);
        let entry = self.entries.get_mut(key)?;
        entry.rearm_idle(idle_timer);

        self.stats.record_hit();
        trace!("Cache hit for key {}", key);
        Some(entry.value.clone())
    }

    // == Contains ==
    /// Checks presence without touching timers or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry for `key` without counting it as a read.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns false if it was absent.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        if removed {
            debug!("Deleted key {}", key);
        }
        removed
    }

    // == Expire ==
    /// Handles a fired timer.
    ///
    /// Only removes the entry if `timer_id` is still the armed timer of that
    /// kind; a fire that lost the race with a delete, overwrite or idle reset
    /// is ignored.
    pub fn expire(&mut self, key: &str, kind: ExpiryKind, timer_id: u64) -> bool {
        let current = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.timer_id(kind) == timer_id);

        if !current {
            trace!("Ignoring outdated {} timer for key {}", kind, key);
            return false;
        }

        self.remove_entry(key);
        self.stats.record_expiration(kind);
        debug!("Expired key {} ({} timer)", key, kind);
        true
    }

    // == Clear ==
    /// Removes every entry, cancelling all pending timers.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
        count
    }

    /// Counts a `get` answered by another caller's in-flight fetch.
    pub fn record_hit(&mut self) {
        self.stats.record_hit();
    }

    pub fn record_miss(&mut self) {
        self.stats.record_miss();
    }

    pub fn record_fetch_failure(&mut self) {
        self.stats.record_fetch_failure();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the oldest-created entry.
    fn evict_oldest(&mut self) {
        let Some(oldest) = self.order.oldest().map(str::to_string) else {
            return;
        };
        if self.remove_entry(&oldest).is_some() {
            self.stats.record_eviction();
            debug!("Evicted oldest key {} (max_count exceeded)", oldest);
        }
    }

    /// The single deletion path: drops the entry, its order record and,
    /// through `ArmedTimer`'s drop, both of its timers.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.seq);
        self.stats.set_total_entries(self.entries.len());
        Some(entry)
    }

    /// Schedules an expiry timer of `kind` for `key`.
    fn arm(&mut self, key: &str, kind: ExpiryKind) -> ArmedTimer {
        let id = self.next_timer_id;
        self.next_timer_id += 1;

        let delay = match kind {
            ExpiryKind::Stale => self.config.stale_time,
            ExpiryKind::Idle => self.config.unused_time,
        };

        let store = self.this.clone();
        let key = key.to_string();
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(store) = store.upgrade() {
                    store.lock().expire(&key, kind, id);
                }
            }),
        );

        ArmedTimer::new(id, handle)
    }
}

impl<V> std::fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
