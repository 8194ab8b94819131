//! # Worker abstraction for device-pinned execution.
//!
//! Defines the [`Worker`] trait, the lifecycle contract a user implements to
//! process tasks on one accelerator device.
//!
//! - **[`Worker`]** — trait with `setup` / `process` / `cleanup` hooks
//! - **[`FnWorker`](crate::FnWorker)** — closure-backed implementation for
//!   stateless bodies
//!
//! ## Rules
//! - Construction must be trivial. The instance is created by the user
//!   factory inside the dispatcher and handed to a worker task; heavy
//!   initialization (model loading, device context acquisition) belongs in
//!   `setup`, which runs on the worker task itself.
//! - One instance serves one device for the whole run. `process` takes
//!   `&mut self`, so per-worker state carried from `setup` needs no locking.
//! - `process` bodies that do heavy synchronous compute should hop through
//!   `tokio::task::spawn_blocking`; a body that never yields cannot be
//!   interrupted by the per-task timeout until its next suspension point.

mod runtime;
mod worker_fn;

pub use worker_fn::FnWorker;

pub(crate) use runtime::WorkerRuntime;

use async_trait::async_trait;

use crate::error::WorkerError;

/// Lifecycle contract for one device-pinned worker.
///
/// A worker lives for an entire run: `setup` once, `process` per task,
/// `cleanup` once. Failures in `process` are per-task (the worker keeps
/// consuming); a failure in `setup` removes the worker from the pool.
///
/// ## Example
///
/// ```rust
/// use async_trait::async_trait;
/// use gpupool::{Worker, WorkerError};
///
/// struct Doubler {
///     device_id: u32,
/// }
///
/// #[async_trait]
/// impl Worker for Doubler {
///     type Payload = u64;
///     type Output = u64;
///     type Config = ();
///
///     async fn setup(&mut self, device_id: u32, _seed: u64, _config: &()) -> Result<(), WorkerError> {
///         self.device_id = device_id;
///         Ok(())
///     }
///
///     async fn process(&mut self, payload: u64) -> Result<u64, WorkerError> {
///         Ok(payload * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + 'static {
    /// Work item type, moved from the feeder to exactly one worker.
    type Payload: Send + 'static;

    /// Result type, moved back to the monitor loop on success.
    type Output: Send + 'static;

    /// Per-run setup parameters, cloned once per worker.
    type Config: Clone + Send + Sync + 'static;

    /// Called once, before any task.
    ///
    /// `seed` is `base_seed + ordinal`, where ordinal is this worker's
    /// position in the configured device list.
    async fn setup(
        &mut self,
        device_id: u32,
        seed: u64,
        config: &Self::Config,
    ) -> Result<(), WorkerError>;

    /// Called per task. An `Err` is reported as a task error; the worker
    /// continues with the next task.
    async fn process(&mut self, payload: Self::Payload) -> Result<Self::Output, WorkerError>;

    /// Called once, after the consumption loop ends. Defaults to a no-op.
    ///
    /// Not called if `setup` failed.
    async fn cleanup(&mut self) -> Result<(), WorkerError> {
        Ok(())
    }
}
