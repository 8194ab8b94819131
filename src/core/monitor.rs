//! # Outcome dispatch for the monitor loop.
//!
//! [`Monitor`] owns the user [`Callbacks`] and the [`RunSummary`] for one
//! run and translates each received [`Outcome`] into exactly one callback
//! invocation plus counter updates. The receive loop itself lives in the
//! dispatcher; this type keeps the exhaustive match in one place.

use crate::callbacks::Callbacks;
use crate::protocol::Outcome;
use crate::report::RunSummary;

pub(crate) struct Monitor<R> {
    callbacks: Callbacks<R>,
    summary: RunSummary,
}

impl<R> Monitor<R> {
    pub(crate) fn new(callbacks: Callbacks<R>) -> Self {
        Self {
            callbacks,
            summary: RunSummary::default(),
        }
    }

    /// Dispatches one outcome to the matching callback.
    ///
    /// Worker-scoped failures adjust the pool accounting; `CleanupFailed`
    /// is surfaced as a best-effort warning because the worker is terminal
    /// either way and the error wire carries task ids only.
    pub(crate) fn handle(&mut self, outcome: Outcome<R>) {
        match outcome {
            Outcome::TaskStarted { task_id, worker_id } => {
                self.summary.started += 1;
                self.callbacks.task_start(task_id, worker_id);
            }
            Outcome::TaskSuccess {
                task_id,
                result,
                worker_id,
            } => {
                self.summary.succeeded += 1;
                self.callbacks.success(task_id, result, worker_id);
            }
            Outcome::TaskError {
                task_id,
                error,
                worker_id,
            } => {
                self.summary.failed += 1;
                self.callbacks.error(task_id, &error, worker_id);
            }
            Outcome::TaskTimeout {
                task_id,
                timeout,
                worker_id,
            } => {
                self.summary.timed_out += 1;
                self.callbacks.timeout(task_id, timeout, worker_id);
            }
            Outcome::SetupFailed { device_id, error } => {
                self.summary.setup_failures += 1;
                self.callbacks.setup_fail(device_id, &error);
            }
            Outcome::CleanupFailed { device_id, error } => {
                self.summary.cleanup_failures += 1;
                eprintln!("gpupool: cleanup failed for device {device_id}: {error}");
            }
        }
    }

    /// Tasks that reached a terminal outcome so far.
    pub(crate) fn terminal(&self) -> u64 {
        self.summary.terminal()
    }

    pub(crate) fn into_parts(self) -> (Callbacks<R>, RunSummary) {
        (self.callbacks, self.summary)
    }
}
