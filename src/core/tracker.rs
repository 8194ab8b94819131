//! # Live-worker tracker.
//!
//! Maintains which workers are still live. Workers mark themselves gone on
//! every exit path (setup failure, normal drain, cancellation); a worker that
//! is hard-aborted never does, which is exactly what makes the remaining live
//! set the "stuck" report for
//! [`RuntimeError::GraceExceeded`](crate::RuntimeError::GraceExceeded).

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Thread-safe map of device id to liveness.
pub(crate) struct WorkerTracker {
    state: RwLock<HashMap<u32, bool>>,
}

impl WorkerTracker {
    /// Creates a tracker with every configured device marked live.
    pub(crate) fn new(device_ids: &[u32]) -> Self {
        let state = device_ids.iter().map(|&id| (id, true)).collect();
        Self {
            state: RwLock::new(state),
        }
    }

    /// Marks one worker as gone. Idempotent.
    pub(crate) async fn mark_gone(&self, device_id: u32) {
        if let Some(live) = self.state.write().await.get_mut(&device_id) {
            *live = false;
        }
    }

    /// Number of workers still live (candidates for a stop sentinel).
    pub(crate) async fn live_count(&self) -> usize {
        self.state.read().await.values().filter(|&&live| live).count()
    }

    /// Sorted device ids of workers still live.
    pub(crate) async fn live_devices(&self) -> Vec<u32> {
        let state = self.state.read().await;
        let mut ids: Vec<u32> = state
            .iter()
            .filter(|(_, &live)| live)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
