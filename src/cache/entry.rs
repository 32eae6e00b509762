//! Cache Entry Module
//!
//! Defines individual cache entries and the expiry timers armed for them.

use std::fmt;

use tokio::time::{Duration, Instant};

use crate::timer::TimerHandle;

// == Expiry Kind ==
/// Which of an entry's two timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryKind {
    /// Absolute age since the last `set`
    Stale,
    /// Inactivity since the last read
    Idle,
}

impl fmt::Display for ExpiryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryKind::Stale => f.write_str("stale"),
            ExpiryKind::Idle => f.write_str("idle"),
        }
    }
}

// == Armed Timer ==
/// A pending expiry timer owned by an entry.
///
/// Dropping an armed timer cancels it, so replacing or removing an entry
/// always cancels its timers.
pub(crate) struct ArmedTimer {
    pub(crate) id: u64,
    handle: Box<dyn TimerHandle>,
}

impl ArmedTimer {
    pub(crate) fn new(id: u64, handle: Box<dyn TimerHandle>) -> Self {
        Self { id, handle }
    }
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl fmt::Debug for ArmedTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmedTimer").field("id", &self.id).finish()
    }
}

// == Cache Entry ==
/// A single cached value with its creation metadata and expiry timers.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was stored (reset on overwrite)
    pub created_at: Instant,
    /// Creation sequence number, strictly increasing across the store
    pub(crate) seq: u64,
    stale_timer: ArmedTimer,
    idle_timer: ArmedTimer,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub(crate) fn new(value: V, seq: u64, stale_timer: ArmedTimer, idle_timer: ArmedTimer) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            seq,
            stale_timer,
            idle_timer,
        }
    }

    /// Time elapsed since the entry was stored.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Id of the currently armed timer of the given kind.
    pub(crate) fn timer_id(&self, kind: ExpiryKind) -> u64 {
        match kind {
            ExpiryKind::Stale => self.stale_timer.id,
            ExpiryKind::Idle => self.idle_timer.id,
        }
    }

    /// Replaces the idle timer; the previous one is cancelled on drop.
    pub(crate) fn rearm_idle(&mut self, timer: ArmedTimer) {
        self.idle_timer = timer;
    }
}
