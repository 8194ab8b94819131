//! # Feeder: the single producer.
//!
//! Pulls items from the user task source and enqueues them with dense,
//! monotonically increasing ids starting at 0.
//!
//! ## Rules
//! - The feeder never enqueues after the source is exhausted or after
//!   shutdown begins; an item held while shutdown fires is dropped (it was
//!   never accepted, its id is never observed).
//! - A panic while pulling the source is the "source raised" case: the
//!   feeder cancels the run token and reports
//!   [`RuntimeError::SourceFailed`], which `run` returns after the drain.
//! - [`FeedState`] is the monitor's view of progress: how many tasks were
//!   accepted, and whether the feeder is done. The count is published before
//!   the finished latch so a reader that observes `done` sees the final count.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{FutureExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, panic_reason};
use crate::protocol::queue::{TaskMsg, TaskQueue};

/// Feeder progress shared with the monitor loop.
pub(crate) struct FeedState {
    accepted: AtomicU64,
    finished: CancellationToken,
}

impl FeedState {
    pub(crate) fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            finished: CancellationToken::new(),
        }
    }

    /// Number of tasks accepted onto the queue so far.
    pub(crate) fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Acquire)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.is_cancelled()
    }

    /// Completes once the feeder has exited.
    pub(crate) async fn wait_finished(&self) {
        self.finished.cancelled().await;
    }

    fn record(&self, accepted: u64) {
        self.accepted.store(accepted, Ordering::Release);
    }

    fn finish(&self) {
        self.finished.cancel();
    }
}

/// Runs the feeder until exhaustion, shutdown, or a source failure.
pub(crate) async fn run_feeder<P, S>(
    source: S,
    queue: TaskQueue<P>,
    state: Arc<FeedState>,
    token: CancellationToken,
) -> Result<(), RuntimeError>
where
    P: Send + 'static,
    S: Stream<Item = P> + Send + 'static,
{
    let mut source = Box::pin(source);
    let mut task_id: u64 = 0;

    let result = loop {
        if token.is_cancelled() {
            break Ok(());
        }

        let payload = match AssertUnwindSafe(source.next()).catch_unwind().await {
            Ok(Some(payload)) => payload,
            Ok(None) => break Ok(()),
            Err(panic) => {
                token.cancel();
                break Err(RuntimeError::SourceFailed {
                    reason: panic_reason(panic),
                });
            }
        };

        // Blocking put; shutdown releases the held item without accepting it.
        let accepted = tokio::select! {
            biased;
            _ = token.cancelled() => false,
            sent = queue.push(TaskMsg::Run { task_id, payload }) => sent,
        };
        if !accepted {
            break Ok(());
        }

        task_id += 1;
        state.record(task_id);
    };

    state.finish();
    result
}
