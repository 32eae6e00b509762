//! Tokio-backed Scheduler
//!
//! Each timer is a spawned task that sleeps for its delay and then runs the
//! callback. Cancelling aborts the task.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::error::Result;
use crate::timer::{Scheduler, TimerHandle, TimerTask};

/// Scheduler that runs timers on a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    // == Constructors ==
    /// Creates a scheduler bound to the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self::from_handle(Handle::current())
    }

    /// Creates a scheduler bound to the current Tokio runtime, or fails with
    /// `CacheError::NoRuntime`.
    pub fn try_current() -> Result<Self> {
        Ok(Self::from_handle(Handle::try_current()?))
    }

    /// Creates a scheduler bound to the given runtime handle.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        trace!("Scheduled timer in {:?}", delay);
        Box::new(join.abort_handle())
    }
}

impl TimerHandle for AbortHandle {
    fn cancel(&self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let _handle = scheduler.schedule(Duration::from_millis(100), counting_task(&fired));

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(50), counting_task(&fired));
        handle.cancel();
        // Idempotent
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(10), counting_task(&fired));
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_current_outside_runtime() {
        assert!(TokioScheduler::try_current().is_err());
    }
}
