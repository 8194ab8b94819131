//! # gpupool
//!
//! **gpupool** streams a lazy, possibly unbounded sequence of work items
//! through a fixed pool of long-lived workers, each pinned to one accelerator
//! device, and surfaces per-item outcomes through user callbacks.
//!
//! ## Features
//!
//! | Area             | Description                                                      | Key types / traits            |
//! |------------------|------------------------------------------------------------------|-------------------------------|
//! | **Workers**      | Device-pinned lifecycle: `setup`, `process` per task, `cleanup`. | [`Worker`], [`FnWorker`]      |
//! | **Dispatch**     | Bounded-queue pipeline with backpressure and orderly shutdown.   | [`Dispatcher`], [`RunOptions`]|
//! | **Callbacks**    | Per-outcome hooks, serialized on the monitor loop.               | [`Callbacks`]                 |
//! | **Protocol**     | Closed set of tagged outcome messages.                           | [`Outcome`]                   |
//! | **Errors**       | Typed errors for the engine and for worker code.                 | [`RuntimeError`], [`WorkerError`] |
//! | **Statistics**   | Per-run totals returned by `run`.                                | [`RunSummary`]                |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`ConsoleWriter`] _(demo/reference only)_.
//!
//! ## Pipeline
//! ```text
//! source ──► feeder ──► task queue ──► workers (one per device) ──► results ──► callbacks
//!                        (bounded)                                 (unbounded)
//! ```
//!
//! Backpressure comes from the bounded task queue alone: when workers fall
//! behind, the feeder blocks and the source is no longer pulled. Per-worker
//! outcome order follows dequeue order; outcomes from different workers
//! interleave arbitrarily.
//!
//! ```no_run
//! use futures::stream;
//! use gpupool::{Callbacks, Dispatcher, FnWorker, RunOptions, WorkerError};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One worker per device; each instance owns its device for the run.
//!     let dispatcher = Dispatcher::new(
//!         || FnWorker::new(|x: u64| async move { Ok::<_, WorkerError>(x * 2) }),
//!         vec![0, 1],
//!     )?;
//!
//!     let callbacks = Callbacks::new(|task_id, doubled, worker_id| {
//!         println!("#{task_id} -> {doubled} (device {worker_id})");
//!     });
//!
//!     dispatcher
//!         .run(stream::iter(0..64u64), callbacks, RunOptions::default())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod callbacks;
mod config;
mod core;
mod error;
mod protocol;
mod report;
mod worker;

#[cfg(feature = "logging")]
mod console;

// ---- Public re-exports ----

pub use callbacks::Callbacks;
pub use config::Config;
pub use crate::core::dispatcher::{Dispatcher, RunOptions};
pub use error::{RuntimeError, WorkerError};
pub use protocol::Outcome;
pub use report::RunSummary;
pub use worker::{FnWorker, Worker};

// Optional: expose the simple built-in console reporter (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use console::ConsoleWriter;
