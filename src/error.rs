//! # Error types used by the gpupool runtime and workers.
//!
//! This module defines two error types:
//!
//! - [`RuntimeError`] errors raised by the dispatch engine itself.
//! - [`WorkerError`] errors raised by user worker code (`setup`, `process`, `cleanup`).
//!
//! [`RuntimeError`] provides `as_label` for stable snake_case labels in logs/metrics.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the dispatch engine.
///
/// These represent failures of the pipeline itself, not of individual tasks.
/// Per-task failures never surface here; they flow through the outcome
/// protocol into the user callbacks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The dispatcher was constructed with an empty device list.
    #[error("device_ids cannot be empty")]
    NoDevices,

    /// The same device id was configured more than once.
    ///
    /// Workers are identified by their device, so a duplicate would alias
    /// two workers under one id.
    #[error("device {device_id} configured more than once")]
    DuplicateDevice {
        /// The repeated device id.
        device_id: u32,
    },

    /// The user task source panicked while being pulled.
    ///
    /// The feeder records the failure and triggers shutdown; the error is
    /// returned from `run` after the pipeline has drained and `on_exit` ran.
    #[error("task source failed: {reason}")]
    SourceFailed {
        /// Panic payload rendered as text.
        reason: String,
    },

    /// Shutdown grace period was exceeded; some workers remained stuck and
    /// had to be force-terminated.
    #[error("shutdown grace {grace:?} exceeded; stuck devices: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Device ids of workers that did not stop in time.
        stuck: Vec<u32>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoDevices => "runtime_no_devices",
            RuntimeError::DuplicateDevice { .. } => "runtime_duplicate_device",
            RuntimeError::SourceFailed { .. } => "runtime_source_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Error produced by user worker code.
///
/// Returned from [`Worker::setup`](crate::Worker::setup),
/// [`Worker::process`](crate::Worker::process) and
/// [`Worker::cleanup`](crate::Worker::cleanup). The engine never inspects the
/// reason; it is rendered to text and carried on the result channel as the
/// diagnostic of the matching outcome.
#[derive(Error, Debug)]
#[error("{reason}")]
pub struct WorkerError {
    reason: String,
}

impl WorkerError {
    /// Creates a worker error from any printable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<String> for WorkerError {
    fn from(reason: String) -> Self {
        Self { reason }
    }
}

impl From<&str> for WorkerError {
    fn from(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for WorkerError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

/// Renders a panic payload as text.
///
/// Used wherever user code is isolated with `catch_unwind`: worker lifecycle
/// hooks, the task source, and monitor-loop callbacks.
pub(crate) fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(RuntimeError::NoDevices.as_label(), "runtime_no_devices");
        assert_eq!(
            RuntimeError::GraceExceeded {
                grace: Duration::from_secs(3),
                stuck: vec![1],
            }
            .as_label(),
            "runtime_grace_exceeded"
        );
    }

    #[test]
    fn worker_error_renders_reason() {
        let err = WorkerError::new("cuda context lost");
        assert_eq!(err.to_string(), "cuda context lost");
        let err: WorkerError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn panic_reason_handles_common_payloads() {
        assert_eq!(panic_reason(Box::new("static str")), "static str");
        assert_eq!(panic_reason(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_reason(Box::new(42_u8)), "unknown panic");
    }
}
