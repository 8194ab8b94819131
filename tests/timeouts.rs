//! Per-task timeout tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream;
use gpupool::{Callbacks, Dispatcher, FnWorker, RunOptions, WorkerError};

#[tokio::test(flavor = "multi_thread")]
async fn timeout_interrupts_then_worker_survives() {
    let timeouts: Arc<Mutex<Vec<(u64, Duration, u32)>>> = Arc::new(Mutex::new(Vec::new()));
    let successes: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let (timeout_sink, ok_sink) = (Arc::clone(&timeouts), Arc::clone(&successes));

    let dispatcher = Dispatcher::new(
        || {
            FnWorker::new(|ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok::<_, WorkerError>(ms)
            })
        },
        vec![0],
    )
    .expect("valid dispatcher");

    let callbacks = Callbacks::new(move |task_id, result, _worker_id| {
        ok_sink.lock().unwrap().push((task_id, result));
    })
    .on_timeout(move |task_id, budget, worker_id| {
        timeout_sink.lock().unwrap().push((task_id, budget, worker_id));
    });

    let budget = Duration::from_millis(200);
    let summary = dispatcher
        .run(
            // Task 0 sleeps far past the budget; task 1 returns immediately.
            stream::iter(vec![5_000u64, 0]),
            callbacks,
            RunOptions::default().with_task_timeout(budget),
        )
        .await
        .expect("run succeeds");

    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.started, 2);

    assert_eq!(timeouts.lock().unwrap().as_slice(), [(0, budget, 0)]);
    assert_eq!(successes.lock().unwrap().as_slice(), [(1, 0)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn without_budget_slow_tasks_finish() {
    let dispatcher = Dispatcher::new(
        || {
            FnWorker::new(|ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok::<_, WorkerError>(ms)
            })
        },
        vec![0],
    )
    .expect("valid dispatcher");

    let summary = dispatcher
        .run(
            stream::iter(vec![100u64]),
            Callbacks::new(|_, _, _| {}),
            RunOptions::default(),
        )
        .await
        .expect("run succeeds");

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.timed_out, 0);
}
