//! Failure-path tests: body errors, panics, setup and cleanup failures,
//! callback isolation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use gpupool::{Callbacks, Config, Dispatcher, FnWorker, RunOptions, Worker, WorkerError};

/// Worker whose setup fails on selected devices.
struct FlakySetup;

#[async_trait]
impl Worker for FlakySetup {
    type Payload = u64;
    type Output = u64;
    type Config = ();

    async fn setup(&mut self, device_id: u32, _seed: u64, _config: &()) -> Result<(), WorkerError> {
        if device_id == 1 {
            return Err(WorkerError::new("device 1 unavailable"));
        }
        Ok(())
    }

    async fn process(&mut self, payload: u64) -> Result<u64, WorkerError> {
        Ok(payload)
    }
}

/// Worker whose setup always fails.
struct DoomedSetup;

#[async_trait]
impl Worker for DoomedSetup {
    type Payload = u64;
    type Output = u64;
    type Config = ();

    async fn setup(&mut self, _device_id: u32, _seed: u64, _config: &()) -> Result<(), WorkerError> {
        Err(WorkerError::new("no devices present"))
    }

    async fn process(&mut self, payload: u64) -> Result<u64, WorkerError> {
        Ok(payload)
    }
}

/// Worker whose cleanup fails.
struct LeakyCleanup;

#[async_trait]
impl Worker for LeakyCleanup {
    type Payload = u64;
    type Output = u64;
    type Config = ();

    async fn setup(&mut self, _device_id: u32, _seed: u64, _config: &()) -> Result<(), WorkerError> {
        Ok(())
    }

    async fn process(&mut self, payload: u64) -> Result<u64, WorkerError> {
        Ok(payload)
    }

    async fn cleanup(&mut self) -> Result<(), WorkerError> {
        Err(WorkerError::new("context leak"))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn body_error_reports_then_worker_continues() {
    let errors: Arc<Mutex<Vec<(u64, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let successes: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let (err_sink, ok_sink) = (Arc::clone(&errors), Arc::clone(&successes));

    let dispatcher = Dispatcher::new(
        || {
            FnWorker::new(|x: u64| async move {
                if x == 5 {
                    return Err(WorkerError::new("boom: cannot handle 5"));
                }
                Ok(x)
            })
        },
        vec![0],
    )
    .expect("valid dispatcher");

    let callbacks = Callbacks::new(move |task_id, result, _worker_id| {
        ok_sink.lock().unwrap().push((task_id, result));
    })
    .on_error(move |task_id, error, _worker_id| {
        err_sink.lock().unwrap().push((task_id, error.to_string()));
    });

    let summary = dispatcher
        .run(stream::iter(vec![5u64, 6]), callbacks, RunOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, 0);
    assert!(errors[0].1.contains("boom"));
    assert_eq!(successes.lock().unwrap().as_slice(), [(1, 6)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn body_panic_becomes_task_error() {
    let errors: Arc<Mutex<Vec<(u64, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let err_sink = Arc::clone(&errors);

    let dispatcher = Dispatcher::new(
        || {
            FnWorker::new(|x: u64| async move {
                if x == 1 {
                    panic!("payload 1 is poisoned");
                }
                Ok::<_, WorkerError>(x)
            })
        },
        vec![0],
    )
    .expect("valid dispatcher");

    let callbacks = Callbacks::new(|_, _, _| {}).on_error(move |task_id, error, _worker_id| {
        err_sink.lock().unwrap().push((task_id, error.to_string()));
    });

    let summary = dispatcher
        .run(stream::iter(vec![1u64, 2]), callbacks, RunOptions::default())
        .await
        .expect("run succeeds");

    // The panic is contained; the worker survives and finishes task 1.
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    let errors = errors.lock().unwrap();
    assert_eq!(errors[0].0, 0);
    assert!(errors[0].1.contains("poisoned"));
}

#[tokio::test(flavor = "multi_thread")]
async fn setup_failure_reduces_the_pool() {
    let setup_failures: Arc<Mutex<Vec<(u32, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let results: Arc<Mutex<Vec<(u64, u32)>>> = Arc::new(Mutex::new(Vec::new()));
    let (fail_sink, ok_sink) = (Arc::clone(&setup_failures), Arc::clone(&results));
    let exits = Arc::new(AtomicU32::new(0));
    let exit_counter = Arc::clone(&exits);

    let dispatcher = Dispatcher::new(|| FlakySetup, vec![0, 1]).expect("valid dispatcher");

    let callbacks = Callbacks::new(move |task_id, _result, worker_id| {
        ok_sink.lock().unwrap().push((task_id, worker_id));
    })
    .on_setup_fail(move |device_id, error| {
        fail_sink.lock().unwrap().push((device_id, error.to_string()));
    })
    .on_exit(move || {
        exit_counter.fetch_add(1, Ordering::SeqCst);
    });

    let summary = dispatcher
        .run(stream::iter(0..20u64), callbacks, RunOptions::default())
        .await
        .expect("run continues with fewer workers");

    assert_eq!(summary.setup_failures, 1);
    assert_eq!(summary.succeeded, 20);
    assert_eq!(exits.load(Ordering::SeqCst), 1);

    let setup_failures = setup_failures.lock().unwrap();
    assert_eq!(setup_failures.len(), 1);
    assert_eq!(setup_failures[0].0, 1);
    assert!(setup_failures[0].1.contains("unavailable"));

    // Every task was delivered by the surviving worker.
    for (_, worker_id) in results.lock().unwrap().iter() {
        assert_eq!(*worker_id, 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn all_setup_failures_drain_and_return() {
    let setup_failures = Arc::new(AtomicU32::new(0));
    let fail_counter = Arc::clone(&setup_failures);
    let exits = Arc::new(AtomicU32::new(0));
    let exit_counter = Arc::clone(&exits);

    let dispatcher = Dispatcher::with_config(
        || DoomedSetup,
        vec![0, 1],
        Config {
            queue_size: 4,
            ..Config::default()
        },
    )
    .expect("valid dispatcher");

    let callbacks = Callbacks::new(|_, _: u64, _| {})
        .on_setup_fail(move |_device_id, _error| {
            fail_counter.fetch_add(1, Ordering::SeqCst);
        })
        .on_exit(move || {
            exit_counter.fetch_add(1, Ordering::SeqCst);
        });

    let summary = dispatcher
        .run(stream::iter(0..10u64), callbacks, RunOptions::default())
        .await
        .expect("reduce-and-continue returns normally");

    assert_eq!(setup_failures.load(Ordering::SeqCst), 2);
    assert_eq!(summary.setup_failures, 2);
    assert_eq!(summary.succeeded, 0);
    // Everything the feeder accepted was discarded unprocessed.
    assert_eq!(summary.dispatched, summary.discarded);
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_failure_is_counted_not_fatal() {
    let dispatcher = Dispatcher::new(|| LeakyCleanup, vec![0]).expect("valid dispatcher");

    let summary = dispatcher
        .run(
            stream::iter(vec![1u64, 2, 3]),
            Callbacks::new(|_, _, _| {}),
            RunOptions::default(),
        )
        .await
        .expect("cleanup failure is not fatal");

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.cleanup_failures, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_callback_does_not_break_the_loop() {
    let exits = Arc::new(AtomicU32::new(0));
    let exit_counter = Arc::clone(&exits);

    let dispatcher = Dispatcher::new(
        || FnWorker::new(|x: u64| async move { Ok::<_, WorkerError>(x) }),
        vec![0],
    )
    .expect("valid dispatcher");

    let callbacks = Callbacks::new(|_, _, _| panic!("user bug in on_success")).on_exit(move || {
        exit_counter.fetch_add(1, Ordering::SeqCst);
    });

    let summary = dispatcher
        .run(stream::iter(0..5u64), callbacks, RunOptions::default())
        .await
        .expect("run succeeds despite callback panics");

    assert_eq!(summary.succeeded, 5);
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}
