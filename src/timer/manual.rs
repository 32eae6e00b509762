//! Manual Scheduler
//!
//! A virtual clock: nothing fires until the owner calls `advance`.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::timer::{Scheduler, TimerHandle, TimerTask};

/// Pending timers keyed by (deadline, id); the id breaks deadline ties in
/// scheduling order.
#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), TimerTask>,
}

/// Scheduler driven by an explicitly advanced virtual clock.
///
/// Clones share the same clock, so a test can hand one clone to a cache and
/// keep another to move time forward.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of timers scheduled and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    // == Advance ==
    /// Moves the clock forward by `by`, firing every due timer in deadline
    /// order. Returns the number of timers fired.
    ///
    /// Callbacks run without the clock lock held, so they may schedule or
    /// cancel other timers.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;

        loop {
            let due = {
                let mut state = self.state.lock();
                let next = state.pending.keys().next().copied();
                match next {
                    Some(slot) if slot.0 <= target => {
                        state.now = slot.0;
                        state.pending.remove(&slot)
                    }
                    _ => {
                        state.now = target;
                        None
                    }
                }
            };

            match due {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let slot = (state.now.saturating_add(delay), id);
        state.pending.insert(slot, task);

        Box::new(ManualTimer {
            slot,
            state: Arc::downgrade(&self.state),
        })
    }
}

struct ManualTimer {
    slot: (Duration, u64),
    state: Weak<Mutex<ManualState>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            // Dropped outside the lock in case the task owns something whose
            // drop reaches back into this scheduler.
            let removed = state.lock().pending.remove(&self.slot);
            drop(removed);
        }
    }
}
