//! # Closure-backed worker (`FnWorker`)
//!
//! [`FnWorker`] wraps a closure `F: FnMut(P) -> Fut`, turning a plain async
//! function into a [`Worker`] with no setup state and a no-op cleanup. Useful
//! for quick pipelines and tests; anything that owns a device context should
//! implement [`Worker`] directly.
//!
//! ## Example
//! ```rust
//! use gpupool::{FnWorker, WorkerError};
//!
//! let _w = FnWorker::new(|x: u64| async move { Ok::<_, WorkerError>(x * 2) });
//! ```

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::worker::Worker;

/// Function-backed worker implementation.
///
/// `setup` is a no-op; the closure holds whatever state it captured.
pub struct FnWorker<P, O, F> {
    f: F,
    _marker: PhantomData<fn(P) -> O>,
}

impl<P, O, F, Fut> FnWorker<P, O, F>
where
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<O, WorkerError>>,
{
    /// Creates a worker from a per-payload closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<P, O, F, Fut> Worker for FnWorker<P, O, F>
where
    P: Send + 'static,
    O: Send + 'static,
    F: FnMut(P) -> Fut + Send + 'static,
    Fut: Future<Output = Result<O, WorkerError>> + Send + 'static,
{
    type Payload = P;
    type Output = O;
    type Config = ();

    async fn setup(&mut self, _device_id: u32, _seed: u64, _config: &()) -> Result<(), WorkerError> {
        Ok(())
    }

    async fn process(&mut self, payload: P) -> Result<O, WorkerError> {
        (self.f)(payload).await
    }
}
