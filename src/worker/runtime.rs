//! # Worker runtime: one device, one consumption loop.
//!
//! Hosts a user [`Worker`] instance for its lifetime and turns dequeued tasks
//! into [`Outcome`]s.
//!
//! ## Flow
//! ```text
//! setup() ──err──► SetupFailed ──► exit (no cleanup)
//!    │
//!    ▼
//! loop {
//!   ├─► shutdown token set        → break
//!   ├─► queue closed / Stop seen  → break
//!   └─► Run(task_id, payload):
//!         ├─► emit TaskStarted
//!         ├─► race process(payload) against task_timeout
//!         │     ├─► Ok(result)  → emit TaskSuccess
//!         │     ├─► Err(error)  → emit TaskError
//!         │     ├─► panic       → emit TaskError
//!         │     └─► timer fires → emit TaskTimeout (worker survives)
//! }
//!    │
//!    ▼
//! cleanup() ──err──► CleanupFailed (terminal message)
//! ```
//!
//! ## Rules
//! - Outcomes are emitted in dequeue order; `TaskStarted` always precedes the
//!   task's terminal outcome.
//! - A timeout or a failed task never terminates the worker.
//! - Panics in `setup`/`process`/`cleanup` are caught and rendered into the
//!   matching failure outcome, so one bad payload cannot take a device down.
//! - The tracker is told the worker is gone on every exit path.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::tracker::WorkerTracker;
use crate::error::panic_reason;
use crate::protocol::Outcome;
use crate::protocol::queue::{ResultSink, TaskMsg, TaskQueue};
use crate::worker::Worker;

/// Everything one worker task owns.
pub(crate) struct WorkerRuntime<W: Worker> {
    worker: W,
    device_id: u32,
    seed: u64,
    task_timeout: Option<Duration>,
    config: W::Config,
    queue: TaskQueue<W::Payload>,
    results: ResultSink<W::Output>,
    tracker: Arc<WorkerTracker>,
}

impl<W: Worker> WorkerRuntime<W> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        worker: W,
        device_id: u32,
        seed: u64,
        task_timeout: Option<Duration>,
        config: W::Config,
        queue: TaskQueue<W::Payload>,
        results: ResultSink<W::Output>,
        tracker: Arc<WorkerTracker>,
    ) -> Self {
        Self {
            worker,
            device_id,
            seed,
            task_timeout,
            config,
            queue,
            results,
            tracker,
        }
    }

    /// Runs the worker to completion: setup, consumption loop, cleanup.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        if self.run_setup().await {
            loop {
                let msg = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    msg = self.queue.recv() => msg,
                };
                match msg {
                    None | Some(TaskMsg::Stop) => break,
                    Some(TaskMsg::Run { task_id, payload }) => {
                        self.run_task(task_id, payload).await;
                    }
                }
            }
            self.run_cleanup().await;
        }
        self.tracker.mark_gone(self.device_id).await;
    }

    /// Returns `false` when setup failed; the worker must not enter the loop
    /// and must not run cleanup.
    async fn run_setup(&mut self) -> bool {
        let caught = AssertUnwindSafe(self.worker.setup(self.device_id, self.seed, &self.config))
            .catch_unwind()
            .await;
        let error = match caught {
            Ok(Ok(())) => return true,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_reason(payload),
        };
        self.results.emit(Outcome::SetupFailed {
            device_id: self.device_id,
            error,
        });
        false
    }

    /// Executes one task: started marker, the body race, one terminal outcome.
    async fn run_task(&mut self, task_id: u64, payload: W::Payload) {
        let worker_id = self.device_id;
        self.results.emit(Outcome::TaskStarted { task_id, worker_id });

        let body = AssertUnwindSafe(self.worker.process(payload)).catch_unwind();
        let caught = match self.task_timeout {
            Some(budget) => match time::timeout(budget, body).await {
                Ok(caught) => caught,
                Err(_elapsed) => {
                    self.results.emit(Outcome::TaskTimeout {
                        task_id,
                        timeout: budget,
                        worker_id,
                    });
                    return;
                }
            },
            None => body.await,
        };

        match caught {
            Ok(Ok(result)) => self.results.emit(Outcome::TaskSuccess {
                task_id,
                result,
                worker_id,
            }),
            Ok(Err(err)) => self.results.emit(Outcome::TaskError {
                task_id,
                error: err.to_string(),
                worker_id,
            }),
            Err(payload) => self.results.emit(Outcome::TaskError {
                task_id,
                error: panic_reason(payload),
                worker_id,
            }),
        }
    }

    async fn run_cleanup(&mut self) {
        let caught = AssertUnwindSafe(self.worker.cleanup()).catch_unwind().await;
        let error = match caught {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_reason(payload),
        };
        self.results.emit(Outcome::CleanupFailed {
            device_id: self.device_id,
            error,
        });
    }
}
