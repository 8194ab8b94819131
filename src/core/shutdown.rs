//! # OS signal handling for a dispatch run.
//!
//! Translates process termination requests into a cancel of the run's
//! shutdown token, which the feeder, workers, and monitor loop all observe.
//! The watcher never calls user code; callbacks see the shutdown only through
//! the normal drain of the pipeline.
//!
//! ## Signal set
//! Only interrupt (`SIGINT` / Ctrl-C) and terminate (`SIGTERM`, the default
//! kill signal of service managers) request a graceful drain. Quit-style
//! signals are left at their default disposition on purpose: when a worker is
//! wedged inside a device call, `SIGQUIT` should still produce a core dump
//! instead of another drain attempt.
//!
//! ## Lifetime
//! The watcher races the run token, so it ends itself as soon as the run is
//! over (the dispatcher cancels the token on every exit path). A second
//! signal during the drain has no further effect; the grace window bounds
//! how long that drain can take either way.

use tokio_util::sync::CancellationToken;

/// Spawns a watcher that cancels `token` on the first termination request.
///
/// If signal registration fails the watcher exits without cancelling, leaving
/// explicit [`shutdown`](crate::Dispatcher::shutdown) as the only
/// cancellation path.
pub(crate) fn spawn_signal_watcher(token: CancellationToken) {
    tokio::spawn(watch(token));
}

#[cfg(unix)]
async fn watch(token: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let registered = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    );
    let (mut interrupt, mut terminate) = match registered {
        (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
        _ => return,
    };

    tokio::select! {
        _ = interrupt.recv() => token.cancel(),
        _ = terminate.recv() => token.cancel(),
        _ = token.cancelled() => {}
    }
}

#[cfg(not(unix))]
async fn watch(token: CancellationToken) {
    tokio::select! {
        pressed = tokio::signal::ctrl_c() => {
            if pressed.is_ok() {
                token.cancel();
            }
        }
        _ = token.cancelled() => {}
    }
}
