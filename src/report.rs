//! # Per-run statistics.
//!
//! [`RunSummary`] is the value returned by a successful
//! [`Dispatcher::run`](crate::Dispatcher::run): totals for everything the
//! monitor loop observed, plus wall-clock elapsed time.

use std::time::Duration;

/// Counters for one run.
///
/// The accounting identity holds on every graceful exit:
/// `dispatched == succeeded + failed + timed_out + discarded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks accepted onto the task queue by the feeder.
    pub dispatched: u64,
    /// `TaskStarted` markers observed.
    pub started: u64,
    /// Tasks whose body returned normally.
    pub succeeded: u64,
    /// Tasks whose body failed (error or panic).
    pub failed: u64,
    /// Tasks interrupted by the per-task budget.
    pub timed_out: u64,
    /// Workers that left the pool because `setup` failed.
    pub setup_failures: u64,
    /// Workers whose `cleanup` failed after the loop ended.
    pub cleanup_failures: u64,
    /// Accepted tasks discarded by shutdown without being dispatched.
    pub discarded: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Tasks that reached a terminal outcome.
    pub fn terminal(&self) -> u64 {
        self.succeeded + self.failed + self.timed_out
    }

    /// True when every dispatched task succeeded and every worker set up.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
            && self.timed_out == 0
            && self.setup_failures == 0
            && self.cleanup_failures == 0
            && self.discarded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_sums_the_three_outcomes() {
        let summary = RunSummary {
            succeeded: 5,
            failed: 2,
            timed_out: 1,
            ..RunSummary::default()
        };
        assert_eq!(summary.terminal(), 8);
        assert!(!summary.is_clean());
    }

    #[test]
    fn default_run_is_clean() {
        assert!(RunSummary::default().is_clean());
    }
}
