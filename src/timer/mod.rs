//! Timer Facility Module
//!
//! Delayed, cancellable callbacks used to expire cache entries.
//!
//! # Schedulers
//! - `TokioScheduler`: one sleeping task per timer on a Tokio runtime
//! - `ManualScheduler`: virtual clock advanced explicitly by the caller

mod manual;
mod runtime;

use std::time::Duration;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;

/// Callback run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

// == Timer Handle ==
/// Handle to a pending timer.
///
/// `cancel` is idempotent and a no-op once the timer has fired.
pub trait TimerHandle: Send {
    fn cancel(&self);
}

// == Scheduler ==
/// Schedules a callback to run once after `delay`.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle>;
}
