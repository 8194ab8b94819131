//! # Pipeline channels.
//!
//! Thin ownership wrappers over tokio mpsc channels:
//!
//! - [`TaskQueue`] — bounded, multi-consumer, FIFO. The single feeder pushes;
//!   every worker pulls from a shared receiver. The bound is the backpressure
//!   mechanism: a full queue blocks the feeder, which stops pulling the user
//!   source.
//! - [`ResultSink`] / [`result_channel`] — unbounded result channel. It must
//!   never exert backpressure on workers, so `emit` cannot block.
//!
//! ## Rules
//! - Multi-consumer FIFO is a shared receiver behind an async mutex; a worker
//!   holds the lock only for the duration of one `recv`.
//! - `drain` discards buffered work items and reports how many were dropped.
//! - Stop sentinels are enqueued best-effort with a bounded wait, one per
//!   live worker; a worker that sees one leaves its consumption loop.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, timeout};

/// Bounded wait per stop sentinel; a full queue on the shutdown path must not
/// stall the dispatcher.
const STOP_ENQUEUE_WAIT: Duration = Duration::from_millis(500);

/// Task-direction message: one work item, or the stop sentinel.
#[derive(Debug)]
pub(crate) enum TaskMsg<P> {
    /// A task accepted by the feeder.
    Run { task_id: u64, payload: P },
    /// Poison sentinel; the receiving worker leaves its consumption loop.
    Stop,
}

/// Bounded, multi-consumer task channel.
pub(crate) struct TaskQueue<P> {
    tx: mpsc::Sender<TaskMsg<P>>,
    rx: Arc<Mutex<mpsc::Receiver<TaskMsg<P>>>>,
}

impl<P> Clone for TaskQueue<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<P> TaskQueue<P> {
    /// Creates a queue with the given capacity (clamped to >= 1).
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Blocking put. Returns `false` if the channel is closed.
    pub(crate) async fn push(&self, msg: TaskMsg<P>) -> bool {
        self.tx.send(msg).await.is_ok()
    }

    /// Blocking get, FIFO across all consumers.
    ///
    /// Returns `None` once the channel is closed and empty. Cancel-safe: a
    /// caller dropped mid-wait loses no message and releases the receiver.
    pub(crate) async fn recv(&self) -> Option<TaskMsg<P>> {
        self.rx.lock().await.recv().await
    }

    /// Enqueues `count` stop sentinels, waiting at most [`STOP_ENQUEUE_WAIT`]
    /// for each slot.
    pub(crate) async fn send_stop(&self, count: usize) {
        for _ in 0..count {
            let _ = timeout(STOP_ENQUEUE_WAIT, self.tx.send(TaskMsg::Stop)).await;
        }
    }

    /// Discards everything currently buffered and returns the number of work
    /// items (not sentinels) that were dropped.
    pub(crate) async fn drain(&self) -> u64 {
        let mut rx = self.rx.lock().await;
        let mut dropped = 0;
        while let Ok(msg) = rx.try_recv() {
            if matches!(msg, TaskMsg::Run { .. }) {
                dropped += 1;
            }
        }
        dropped
    }
}

/// Sending half of the result channel, one clone per worker.
///
/// The channel closes when the last worker drops its sink; the monitor loop
/// uses that closure as the "all workers terminated" signal.
pub(crate) struct ResultSink<R> {
    tx: mpsc::UnboundedSender<crate::protocol::Outcome<R>>,
}

impl<R> Clone for ResultSink<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R> ResultSink<R> {
    /// Emits an outcome. Never blocks.
    ///
    /// A send error means the monitor is gone; the outcome is dropped
    /// silently, the emitting worker is about to be reaped anyway.
    pub(crate) fn emit(&self, outcome: crate::protocol::Outcome<R>) {
        let _ = self.tx.send(outcome);
    }
}

/// Creates the result channel for one run.
pub(crate) fn result_channel<R>() -> (
    ResultSink<R>,
    mpsc::UnboundedReceiver<crate::protocol::Outcome<R>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSink { tx }, rx)
}
