//! # Task and worker outcomes.
//!
//! [`Outcome`] is the only vocabulary workers use to report back to the
//! monitor loop. It is a closed sum; the monitor matches it exhaustively and
//! new variants are a breaking change by design.
//!
//! ## Per-worker emission rules
//! - Every dequeued task produces exactly one `TaskStarted` followed by
//!   exactly one of `TaskSuccess | TaskError | TaskTimeout`.
//! - `SetupFailed` precludes any `TaskStarted` from that worker.
//! - `CleanupFailed` is always the worker's last message.

use std::time::Duration;

/// What happened to a task or a worker.
///
/// `R` is the user worker's output type. Results are moved through the
/// channel, never cloned or encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    /// Worker dequeued the task and is about to invoke the user body.
    TaskStarted {
        /// Id assigned by the feeder.
        task_id: u64,
        /// Device id of the emitting worker.
        worker_id: u32,
    },

    /// User body returned normally.
    TaskSuccess {
        task_id: u64,
        /// Value returned by [`Worker::process`](crate::Worker::process).
        result: R,
        worker_id: u32,
    },

    /// User body failed.
    TaskError {
        task_id: u64,
        /// Human-readable diagnostic (error rendering or panic payload).
        error: String,
        worker_id: u32,
    },

    /// Task was interrupted because it exceeded its per-task budget.
    TaskTimeout {
        task_id: u64,
        /// The budget that was exceeded.
        timeout: Duration,
        worker_id: u32,
    },

    /// `setup` failed; this worker will not process tasks.
    SetupFailed {
        device_id: u32,
        error: String,
    },

    /// `cleanup` failed after the consumption loop ended.
    CleanupFailed {
        device_id: u32,
        error: String,
    },
}

impl<R> Outcome<R> {
    /// Returns the task id for task-scoped outcomes, `None` for worker-scoped ones.
    pub fn task_id(&self) -> Option<u64> {
        match self {
            Outcome::TaskStarted { task_id, .. }
            | Outcome::TaskSuccess { task_id, .. }
            | Outcome::TaskError { task_id, .. }
            | Outcome::TaskTimeout { task_id, .. } => Some(*task_id),
            Outcome::SetupFailed { .. } | Outcome::CleanupFailed { .. } => None,
        }
    }

    /// Returns the id of the emitting worker (aliased to its device id).
    pub fn worker_id(&self) -> u32 {
        match self {
            Outcome::TaskStarted { worker_id, .. }
            | Outcome::TaskSuccess { worker_id, .. }
            | Outcome::TaskError { worker_id, .. }
            | Outcome::TaskTimeout { worker_id, .. } => *worker_id,
            Outcome::SetupFailed { device_id, .. } | Outcome::CleanupFailed { device_id, .. } => {
                *device_id
            }
        }
    }

    /// True for the three terminal task outcomes.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Outcome::TaskSuccess { .. } | Outcome::TaskError { .. } | Outcome::TaskTimeout { .. }
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::TaskStarted { .. } => "task_started",
            Outcome::TaskSuccess { .. } => "task_success",
            Outcome::TaskError { .. } => "task_error",
            Outcome::TaskTimeout { .. } => "task_timeout",
            Outcome::SetupFailed { .. } => "setup_failed",
            Outcome::CleanupFailed { .. } => "cleanup_failed",
        }
    }
}
