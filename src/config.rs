//! # Global pipeline configuration.
//!
//! Provides [`Config`] centralized settings for the dispatcher.
//!
//! ## Sentinel values
//! - `queue_size` is clamped to a minimum of 1 by the task queue.
//! - `grace = 0s` → escalate immediately once shutdown is underway.

use std::time::Duration;

/// Global configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// Defines:
/// - **Backpressure**: capacity of the bounded task queue
/// - **Shutdown behavior**: grace period before force-terminating workers
///
/// ## Field semantics
/// - `queue_size`: Task queue capacity. Together with the single feeder this
///   is the backpressure mechanism: when workers are slow the queue fills,
///   the feeder blocks, and the task source is no longer pulled.
/// - `grace`: Maximum wait for workers to finish their current task and run
///   `cleanup` once shutdown is underway. Exceeding it aborts the stragglers
///   and surfaces [`RuntimeError::GraceExceeded`](crate::RuntimeError::GraceExceeded).
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the bounded task queue.
    pub queue_size: usize,

    /// Maximum time to wait for workers to stop once shutdown is underway.
    pub grace: Duration,
}

impl Config {
    /// Returns the task queue capacity clamped to a minimum of 1.
    ///
    /// A zero-capacity channel cannot be constructed; clamping keeps a
    /// `queue_size = 0` configuration meaningful (tightest backpressure).
    #[inline]
    pub fn queue_size_clamped(&self) -> usize {
        self.queue_size.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `queue_size = 1024` (good baseline for small payloads)
    /// - `grace = 3s` (covers typical device teardown)
    fn default() -> Self {
        Self {
            queue_size: 1024,
            grace: Duration::from_secs(3),
        }
    }
}
