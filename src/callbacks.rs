//! # User callbacks.
//!
//! [`Callbacks`] bundles the per-outcome hooks a caller hands to
//! [`Dispatcher::run`](crate::Dispatcher::run). Only `on_success` is
//! required; everything else defaults to a no-op.
//!
//! ## Rules
//! - All callbacks run synchronously on the monitor loop, in the controlling
//!   task; outcomes from one run are serialized, so no locking is needed
//!   across them.
//! - A panicking callback is caught, reported to stderr, and never breaks the
//!   monitor loop.
//! - `on_exit` fires exactly once per `run`, on every exit path.
//!
//! ## Example
//! ```rust
//! use gpupool::Callbacks;
//!
//! let cbs: Callbacks<u64> = Callbacks::new(|task_id, result, worker_id| {
//!     println!("#{task_id} -> {result} (device {worker_id})");
//! })
//! .on_error(|task_id, error, _worker_id| eprintln!("#{task_id} failed: {error}"))
//! .on_exit(|| println!("done"));
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use crate::error::panic_reason;

type SuccessFn<R> = Box<dyn FnMut(u64, R, u32) + Send>;
type ErrorFn = Box<dyn FnMut(u64, &str, u32) + Send>;
type TimeoutFn = Box<dyn FnMut(u64, Duration, u32) + Send>;
type SetupFailFn = Box<dyn FnMut(u32, &str) + Send>;
type TaskStartFn = Box<dyn FnMut(u64, u32) + Send>;
type ExitFn = Box<dyn FnOnce() + Send>;

/// Per-outcome hooks for one run. `R` is the worker output type.
pub struct Callbacks<R> {
    on_success: SuccessFn<R>,
    on_error: Option<ErrorFn>,
    on_timeout: Option<TimeoutFn>,
    on_setup_fail: Option<SetupFailFn>,
    on_task_start: Option<TaskStartFn>,
    on_exit: Option<ExitFn>,
}

impl<R> Callbacks<R> {
    /// Creates a callback set with the required success hook.
    pub fn new(on_success: impl FnMut(u64, R, u32) + Send + 'static) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_error: None,
            on_timeout: None,
            on_setup_fail: None,
            on_task_start: None,
            on_exit: None,
        }
    }

    /// Called when a task's body failed; receives the diagnostic text.
    pub fn on_error(mut self, f: impl FnMut(u64, &str, u32) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called when a task exceeded its per-task budget.
    pub fn on_timeout(mut self, f: impl FnMut(u64, Duration, u32) + Send + 'static) -> Self {
        self.on_timeout = Some(Box::new(f));
        self
    }

    /// Called when a worker's `setup` failed and it left the pool.
    pub fn on_setup_fail(mut self, f: impl FnMut(u32, &str) + Send + 'static) -> Self {
        self.on_setup_fail = Some(Box::new(f));
        self
    }

    /// Called when a worker dequeued a task, before the body runs.
    pub fn on_task_start(mut self, f: impl FnMut(u64, u32) + Send + 'static) -> Self {
        self.on_task_start = Some(Box::new(f));
        self
    }

    /// Called exactly once when `run` is about to return, on every path.
    pub fn on_exit(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_exit = Some(Box::new(f));
        self
    }

    pub(crate) fn success(&mut self, task_id: u64, result: R, worker_id: u32) {
        let f = &mut self.on_success;
        guarded("on_success", AssertUnwindSafe(move || f(task_id, result, worker_id)));
    }

    pub(crate) fn error(&mut self, task_id: u64, error: &str, worker_id: u32) {
        if let Some(f) = self.on_error.as_mut() {
            guarded("on_error", AssertUnwindSafe(move || f(task_id, error, worker_id)));
        }
    }

    pub(crate) fn timeout(&mut self, task_id: u64, timeout: Duration, worker_id: u32) {
        if let Some(f) = self.on_timeout.as_mut() {
            guarded("on_timeout", AssertUnwindSafe(move || f(task_id, timeout, worker_id)));
        }
    }

    pub(crate) fn setup_fail(&mut self, device_id: u32, error: &str) {
        if let Some(f) = self.on_setup_fail.as_mut() {
            guarded("on_setup_fail", AssertUnwindSafe(move || f(device_id, error)));
        }
    }

    pub(crate) fn task_start(&mut self, task_id: u64, worker_id: u32) {
        if let Some(f) = self.on_task_start.as_mut() {
            guarded("on_task_start", AssertUnwindSafe(move || f(task_id, worker_id)));
        }
    }

    /// Fires `on_exit` if present. Taking the hook makes a second call a no-op.
    pub(crate) fn exit(&mut self) {
        if let Some(f) = self.on_exit.take() {
            guarded("on_exit", AssertUnwindSafe(f));
        }
    }
}

/// Runs one callback with panic isolation.
fn guarded<F: FnOnce()>(name: &'static str, f: AssertUnwindSafe<F>) {
    if let Err(payload) = catch_unwind(f) {
        eprintln!("gpupool: {name} callback panicked: {}", panic_reason(payload));
    }
}
