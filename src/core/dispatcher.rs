//! # Dispatcher: owns the pipeline end to end.
//!
//! The [`Dispatcher`] spawns one worker per configured device, runs the
//! feeder, drains the result channel into user callbacks, and performs
//! orderly shutdown.
//!
//! ## Architecture
//! ```text
//! source ──► feeder ──► task queue (bounded) ──► worker 0 ──┐
//!                 │            │               ► worker 1 ──┤
//!                 │            │               ► worker N ──┤
//!                 │            │                            ▼
//!                 │            │                  result channel (unbounded)
//!                 │            │                            │
//!                 ▼            ▼                            ▼
//!            FeedState    drain on shutdown          monitor loop ──► callbacks
//! ```
//!
//! ## Exit conditions of the monitor loop
//! - **All workers terminated** (result channel closed) → natural exit
//! - **Grace deadline hit** → stragglers are aborted, `GraceExceeded`
//!
//! ## Shutdown escalation
//! Stop sentinel (cooperative, between tasks) → run-token cancel
//! (cooperative, at suspension points) → `JoinSet::abort_all` (hard).
//!
//! ## Rules
//! - The grace deadline is armed only once a drain is underway: either the
//!   source is exhausted and every accepted task reached a terminal outcome,
//!   or shutdown was requested.
//! - Buffered tasks are discarded only on the shutdown path, never during a
//!   normal drain.
//! - `on_exit` fires exactly once, after the pool is down and the queues are
//!   drained, on every path out of `run`.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::Stream;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::callbacks::Callbacks;
use crate::config::Config;
use crate::core::feeder::{FeedState, run_feeder};
use crate::core::monitor::Monitor;
use crate::core::shutdown::spawn_signal_watcher;
use crate::core::tracker::WorkerTracker;
use crate::error::{RuntimeError, panic_reason};
use crate::protocol::queue::{TaskQueue, result_channel};
use crate::report::RunSummary;
use crate::worker::{Worker, WorkerRuntime};

/// Per-invocation parameters of [`Dispatcher::run`].
pub struct RunOptions<C> {
    /// Base of the per-worker seed; worker ordinal `i` receives `base_seed + i`.
    pub base_seed: u64,
    /// Per-task budget. `None` disables the timeout.
    ///
    /// The budget interrupts the task body at its next suspension point. A
    /// body that never yields cannot be preempted: if it eventually suspends
    /// past the deadline it is dropped and reported as a timeout, and if it
    /// completes without suspending its result is delivered late. Bodies
    /// doing heavy synchronous compute should hop through `spawn_blocking`
    /// to stay interruptible.
    pub task_timeout: Option<Duration>,
    /// Setup parameters, cloned once per worker and passed to
    /// [`Worker::setup`](crate::Worker::setup).
    pub setup: C,
}

impl<C> RunOptions<C> {
    /// Creates options with the default seed (42) and no timeout.
    pub fn new(setup: C) -> Self {
        Self {
            base_seed: 42,
            task_timeout: None,
            setup,
        }
    }

    /// Sets the base seed.
    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    /// Sets the per-task budget.
    pub fn with_task_timeout(mut self, budget: Duration) -> Self {
        self.task_timeout = Some(budget);
        self
    }
}

impl<C: Default> Default for RunOptions<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

/// Streams a task source through a fixed pool of device-pinned workers.
///
/// - Spawns one long-lived worker task per configured device
/// - Feeds tasks in source order with dense ids, under queue backpressure
/// - Serializes all user callbacks on the monitor loop
/// - Handles OS termination signals and explicit [`shutdown`](Self::shutdown)
pub struct Dispatcher<W, F> {
    factory: F,
    device_ids: Vec<u32>,
    cfg: Config,
    /// Token of the current (or next) run; replaced at each `run` entry.
    shutdown: Mutex<CancellationToken>,
    _worker: PhantomData<fn() -> W>,
}

impl<W, F> Dispatcher<W, F>
where
    W: Worker,
    F: Fn() -> W,
{
    /// Creates a dispatcher with [`Config::default`].
    ///
    /// `factory` is invoked once per device at each `run` to build that
    /// worker's instance; heavy state belongs in `setup`, not here.
    pub fn new(factory: F, device_ids: Vec<u32>) -> Result<Self, RuntimeError> {
        Self::with_config(factory, device_ids, Config::default())
    }

    /// Creates a dispatcher with explicit configuration.
    pub fn with_config(
        factory: F,
        device_ids: Vec<u32>,
        cfg: Config,
    ) -> Result<Self, RuntimeError> {
        if device_ids.is_empty() {
            return Err(RuntimeError::NoDevices);
        }
        let mut sorted = device_ids.clone();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(RuntimeError::DuplicateDevice {
                device_id: pair[0],
            });
        }

        Ok(Self {
            factory,
            device_ids,
            cfg,
            shutdown: Mutex::new(CancellationToken::new()),
            _worker: PhantomData,
        })
    }

    /// The configured devices, in worker-ordinal order.
    pub fn device_ids(&self) -> &[u32] {
        &self.device_ids
    }

    /// Requests graceful shutdown of the current run. Idempotent.
    ///
    /// The feeder stops pulling the source, buffered tasks are discarded,
    /// and workers are drained within the configured grace window.
    pub fn shutdown(&self) {
        match self.shutdown.lock() {
            Ok(token) => token.cancel(),
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }

    /// Runs the pipeline to completion.
    ///
    /// Returns after the source is exhausted (or shutdown was requested), the
    /// pool has drained, and `on_exit` has fired. Fatal conditions
    /// ([`RuntimeError::SourceFailed`], [`RuntimeError::GraceExceeded`]) are
    /// returned only after `on_exit`.
    pub async fn run<S>(
        &self,
        source: S,
        callbacks: Callbacks<W::Output>,
        opts: RunOptions<W::Config>,
    ) -> Result<RunSummary, RuntimeError>
    where
        S: Stream<Item = W::Payload> + Send + 'static,
    {
        let token = CancellationToken::new();
        match self.shutdown.lock() {
            Ok(mut slot) => *slot = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }
        let started_at = Instant::now();

        // The watcher races the token, so it ends with the run.
        spawn_signal_watcher(token.clone());
        let queue = TaskQueue::new(self.cfg.queue_size_clamped());
        let (sink, mut results) = result_channel::<W::Output>();
        let tracker = Arc::new(WorkerTracker::new(&self.device_ids));

        let mut workers = JoinSet::new();
        for (ordinal, &device_id) in self.device_ids.iter().enumerate() {
            let runtime = WorkerRuntime::new(
                (self.factory)(),
                device_id,
                opts.base_seed + ordinal as u64,
                opts.task_timeout,
                opts.setup.clone(),
                queue.clone(),
                sink.clone(),
                Arc::clone(&tracker),
            );
            workers.spawn(runtime.run(token.clone()));
        }
        // The workers hold the only sinks now; channel closure below means
        // every worker reached its terminal state.
        drop(sink);

        let feed = Arc::new(FeedState::new());
        let feeder = tokio::spawn(run_feeder(
            source,
            queue.clone(),
            Arc::clone(&feed),
            token.clone(),
        ));

        let mut monitor = Monitor::new(callbacks);
        let mut feed_seen = feed.is_finished();
        let mut shutdown_seen = false;
        let mut sentinels_sent = false;
        let mut deadline: Option<Instant> = None;
        let mut grace_exceeded = false;
        let mut discarded: u64 = 0;

        loop {
            tokio::select! {
                maybe = results.recv() => match maybe {
                    Some(outcome) => monitor.handle(outcome),
                    None => break,
                },
                _ = feed.wait_finished(), if !feed_seen => {
                    feed_seen = true;
                }
                _ = token.cancelled(), if !shutdown_seen => {
                    shutdown_seen = true;
                }
                _ = time::sleep_until(deadline_or_far(deadline)), if deadline.is_some() => {
                    grace_exceeded = true;
                    break;
                }
            }

            if !sentinels_sent {
                if shutdown_seen {
                    // Interrupt path: discard buffered tasks, then poison the pool.
                    discarded += queue.drain().await;
                    queue.send_stop(tracker.live_count().await).await;
                    sentinels_sent = true;
                    deadline = Some(Instant::now() + self.cfg.grace);
                } else if feed_seen && monitor.terminal() >= feed.accepted() {
                    // Normal drain: every accepted task terminated; poison the pool.
                    queue.send_stop(tracker.live_count().await).await;
                    sentinels_sent = true;
                    deadline = Some(Instant::now() + self.cfg.grace);
                }
            }
        }

        // Deliver outcomes that raced the loop exit.
        while let Ok(outcome) = results.try_recv() {
            monitor.handle(outcome);
        }

        token.cancel();
        let stuck = tracker.live_devices().await;
        if grace_exceeded {
            workers.abort_all();
        }
        while workers.join_next().await.is_some() {}
        while let Ok(outcome) = results.try_recv() {
            monitor.handle(outcome);
        }

        // The cancelled token has released the feeder; reap it before the
        // final drain so late-accepted items are counted as discarded.
        let feeder_result = match feeder.await {
            Ok(result) => result,
            Err(join_err) => {
                let reason = match join_err.try_into_panic() {
                    Ok(payload) => panic_reason(payload),
                    Err(join_err) => join_err.to_string(),
                };
                Err(RuntimeError::SourceFailed { reason })
            }
        };
        discarded += queue.drain().await;

        let (mut callbacks, mut summary) = monitor.into_parts();
        summary.dispatched = feed.accepted();
        summary.discarded = discarded;
        summary.elapsed = started_at.elapsed();
        callbacks.exit();

        feeder_result?;
        if grace_exceeded && !stuck.is_empty() {
            return Err(RuntimeError::GraceExceeded {
                grace: self.cfg.grace,
                stuck,
            });
        }
        Ok(summary)
    }
}

/// The sleep branch is disabled while `deadline` is `None`; the far-future
/// fallback only keeps the future constructible.
fn deadline_or_far(deadline: Option<Instant>) -> Instant {
    deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400))
}
