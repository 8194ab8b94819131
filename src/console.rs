//! # ConsoleWriter — simple outcome printer
//!
//! A minimal reporter that prints [`Outcome`]s to stdout.
//! Use it for tests or demos, typically from inside callbacks or around a
//! custom monitor built on the public protocol types.
//!
//! ## Example output
//! ```text
//! [started] task=3 worker=0
//! [success] task=3 worker=0
//! [error] task=4 worker=1 err="decode failed"
//! [timeout] task=5 worker=0 budget=2s
//! [setup-failed] device=2 err="device unavailable"
//! [cleanup-failed] device=2 err="context leak"
//! ```

use crate::protocol::Outcome;

/// Outcome printer.
pub struct ConsoleWriter;

impl ConsoleWriter {
    /// Prints one outcome as a single `[label] k=v` line.
    pub fn write<R>(outcome: &Outcome<R>) {
        match outcome {
            Outcome::TaskStarted { task_id, worker_id } => {
                println!("[started] task={task_id} worker={worker_id}");
            }
            Outcome::TaskSuccess {
                task_id, worker_id, ..
            } => {
                println!("[success] task={task_id} worker={worker_id}");
            }
            Outcome::TaskError {
                task_id,
                error,
                worker_id,
            } => {
                println!("[error] task={task_id} worker={worker_id} err={error:?}");
            }
            Outcome::TaskTimeout {
                task_id,
                timeout,
                worker_id,
            } => {
                println!("[timeout] task={task_id} worker={worker_id} budget={timeout:?}");
            }
            Outcome::SetupFailed { device_id, error } => {
                println!("[setup-failed] device={device_id} err={error:?}");
            }
            Outcome::CleanupFailed { device_id, error } => {
                println!("[cleanup-failed] device={device_id} err={error:?}");
            }
        }
    }
}
