//! Caching Proxy Module
//!
//! Memoizes an async fetch function behind a [`CacheStore`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::cache::store::SharedStore;
use crate::cache::{CacheStats, CacheStore, KeyNormalizer, StableJsonKey};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::timer::{Scheduler, TokioScheduler};

// == Fetch Item ==
/// Produces the value for a key on a cache miss.
///
/// Implemented for any `Fn(K) -> impl Future<Output = Result<V, E>>`, so
/// async closures work directly.
pub trait FetchItem<K, V>: Send + Sync {
    type Error;

    fn fetch(&self, key: K) -> impl Future<Output = std::result::Result<V, Self::Error>> + Send;
}

impl<K, V, E, F, Fut> FetchItem<K, V> for F
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<V, E>> + Send,
{
    type Error = E;

    fn fetch(&self, key: K) -> impl Future<Output = std::result::Result<V, E>> + Send {
        self(key)
    }
}

/// Receivers for fetches in progress, keyed by normalized key. A successful
/// fetch publishes its value; the sender is dropped when the fetch ends.
type InFlightMap<V> = Mutex<HashMap<String, watch::Receiver<Option<V>>>>;

// == Caching Proxy ==
/// A memoizing cache in front of an async fetch function.
///
/// Entries expire `stale_time` after they were stored, or `unused_time`
/// after they were last read through [`get`](Self::get), whichever comes
/// first. When `max_count` is set, storing past the limit evicts the
/// oldest-created entry.
pub struct CachingProxy<K, V, F> {
    store: SharedStore<V>,
    fetch: F,
    normalizer: Arc<dyn KeyNormalizer<K>>,
    in_flight: InFlightMap<V>,
}

enum Role<'a, V> {
    Leader(InFlight<'a, V>),
    Follower(watch::Receiver<Option<V>>),
}

/// Registration of the fetch a leader is running. Dropping it, on success,
/// failure or cancellation, wakes the followers.
struct InFlight<'a, V> {
    map: &'a InFlightMap<V>,
    key: String,
    result: watch::Sender<Option<V>>,
}

impl<V> InFlight<'_, V> {
    /// Hands the fetched value to every follower.
    fn publish(&self, value: V) {
        self.result.send_replace(Some(value));
    }
}

impl<V> Drop for InFlight<'_, V> {
    fn drop(&mut self) {
        self.map.lock().remove(&self.key);
    }
}

impl<K, V, F> CachingProxy<K, V, F>
where
    K: Serialize,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a proxy whose timers run on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(config: CacheConfig, fetch: F) -> Self {
        Self::with_scheduler(config, fetch, Arc::new(TokioScheduler::current()))
    }

    /// Creates a proxy whose timers run on `scheduler`.
    pub fn with_scheduler(config: CacheConfig, fetch: F, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            store: CacheStore::shared(config, scheduler),
            fetch,
            normalizer: Arc::new(StableJsonKey),
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V, F> CachingProxy<K, V, F>
where
    V: Clone + Send + 'static,
{
    /// Replaces the default stable-JSON key normalizer.
    pub fn with_normalizer(mut self, normalizer: impl KeyNormalizer<K> + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any existing entry and
    /// restarting both of its timers.
    pub fn set(&self, key: &K, value: V) -> Result<()> {
        let normalized = self.normalizer.normalize(key)?;
        self.store.lock().insert(normalized, value);
        Ok(())
    }

    // == Has ==
    /// Returns whether an entry exists for `key`. Does not count as a read.
    pub fn has(&self, key: &K) -> Result<bool> {
        let normalized = self.normalizer.normalize(key)?;
        Ok(self.store.lock().contains(&normalized))
    }

    // == Delete ==
    /// Removes the entry for `key`, if any. Returns whether one was removed.
    pub fn del(&self, key: &K) -> Result<bool> {
        let normalized = self.normalizer.normalize(key)?;
        Ok(self.store.lock().delete(&normalized))
    }

    /// Removes every entry and cancels all pending timers.
    pub fn clear(&self) -> usize {
        let removed = self.store.lock().clear();
        debug!("Cleared {} entries", removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn config(&self) -> CacheConfig {
        self.store.lock().config().clone()
    }
}

impl<K, V, F> CachingProxy<K, V, F>
where
    K: Clone + Sync,
    V: Clone + Send + 'static,
    F: FetchItem<K, V>,
{
    // == Get ==
    /// Returns the cached value for `key`, or fetches and stores it.
    ///
    /// A hit restarts the idle timer only. Fetch errors are returned as they
    /// are and leave the cache untouched; key normalization errors are
    /// converted into the fetch error type.
    pub async fn get(&self, key: &K) -> std::result::Result<V, F::Error>
    where
        F::Error: From<CacheError>,
    {
        let normalized = self.normalizer.normalize(key)?;

        let cached = self.store.lock().lookup(&normalized);
        if let Some(value) = cached {
            return Ok(value);
        }

        let dedupe = self.store.lock().config().dedupe_misses;
        if dedupe {
            self.fetch_deduped(key, normalized).await
        } else {
            self.fetch_and_store(key, normalized).await
        }
    }

    /// Runs at most one fetch per key at a time. Followers receive the
    /// leader's value directly, even if the stored entry is already gone.
    /// Only when the leader ends without a value (failed or cancelled) do
    /// they re-read the cache, and the next one to claim the key fetches.
    async fn fetch_deduped(&self, key: &K, normalized: String) -> std::result::Result<V, F::Error> {
        loop {
            match self.claim(&normalized) {
                Role::Leader(in_flight) => {
                    // A previous leader may have finished since our lookup
                    let cached = self.store.lock().lookup(&normalized);
                    if let Some(value) = cached {
                        in_flight.publish(value.clone());
                        return Ok(value);
                    }

                    let result = self.fetch_and_store(key, normalized.clone()).await;
                    if let Ok(value) = &result {
                        in_flight.publish(value.clone());
                    }
                    return result;
                }
                Role::Follower(mut result) => {
                    trace!("Waiting on in-flight fetch for key {}", normalized);
                    // Errors once the leader's sender is dropped unpublished
                    let _ = result.changed().await;

                    let published = result.borrow_and_update().clone();
                    if let Some(value) = published {
                        self.store.lock().record_hit();
                        return Ok(value);
                    }

                    let cached = self.store.lock().lookup(&normalized);
                    if let Some(value) = cached {
                        return Ok(value);
                    }
                }
            }
        }
    }

    fn claim(&self, normalized: &str) -> Role<'_, V> {
        let mut in_flight = self.in_flight.lock();
        if let Some(done) = in_flight.get(normalized) {
            return Role::Follower(done.clone());
        }

        let (sender, receiver) = watch::channel(None);
        in_flight.insert(normalized.to_string(), receiver);
        Role::Leader(InFlight {
            map: &self.in_flight,
            key: normalized.to_string(),
            result: sender,
        })
    }

    async fn fetch_and_store(&self, key: &K, normalized: String) -> std::result::Result<V, F::Error> {
        self.store.lock().record_miss();
        debug!("Cache miss for key {}, fetching", normalized);

        match self.fetch.fetch(key.clone()).await {
            Ok(value) => {
                self.store.lock().insert(normalized, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.store.lock().record_fetch_failure();
                debug!("Fetch failed for key {}, nothing cached", normalized);
                Err(err)
            }
        }
    }
}

impl<K, V, F> std::fmt::Debug for CachingProxy<K, V, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingProxy")
            .field("store", &*self.store.lock())
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}
