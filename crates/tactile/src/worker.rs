// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-thread plumbing shared by the input and output pipelines.
//!
//! Each pipeline owns one dedicated OS thread. Stopping is cooperative: a
//! cancellation token the worker must observe within bounded time, plus a
//! targeted wake-up signal that interrupts a driver blocked in a syscall
//! so it can re-check the token. Workers mask process-terminating signals,
//! leaving the wake signal as the only asynchronous interruption.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};

use nix::sys::pthread::{pthread_kill, pthread_self, Pthread};
use nix::sys::signal::{SigSet, Signal};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Signal reserved for unblocking a worker stuck in a driver syscall.
pub const WAKE_SIGNAL: Signal = Signal::SIGUSR1;

static WAKE_HANDLER: Once = Once::new();

/// Install the process-wide wake-signal handler. Without one the wake
/// signal would terminate the process; with one it interrupts a blocked
/// syscall so the driver can observe the stop request. Only the first
/// call has effect.
fn install_wake_handler() {
    WAKE_HANDLER.call_once(|| {
        let fired = Arc::new(AtomicBool::new(false));
        if let Err(e) = signal_hook::flag::register(WAKE_SIGNAL as i32, fired) {
            warn!("could not install wake-signal handler: {e}");
        }
    });
}

/// Block process-terminating signals on the calling thread.
fn mask_shutdown_signals() {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGTERM);
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGQUIT);
    if let Err(e) = mask.thread_block() {
        warn!("could not mask shutdown signals on worker thread: {e}");
    }
}

/// A pipeline worker thread plus the handles needed to stop it.
pub(crate) struct WorkerHandle {
    join: JoinHandle<()>,
    token: CancellationToken,
    thread: Arc<Mutex<Option<Pthread>>>,
}

impl WorkerHandle {
    /// Spawn a named worker. The body receives the cancellation token it
    /// must observe within bounded time.
    pub(crate) fn spawn(
        name: String,
        body: impl FnOnce(CancellationToken) + Send + 'static,
    ) -> Result<Self> {
        install_wake_handler();
        let token = CancellationToken::new();
        let thread = Arc::new(Mutex::new(None));
        let worker_token = token.clone();
        let worker_thread = Arc::clone(&thread);
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || {
                mask_shutdown_signals();
                *worker_thread.lock() = Some(pthread_self());
                body(worker_token);
            })
            .map_err(Error::WorkerSpawn)?;
        Ok(Self { join, token, thread })
    }

    /// Request cancellation without joining.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel, wake, and join. Returns false when the worker panicked.
    ///
    /// Wake delivery is best effort; the token remains the authoritative
    /// stop request.
    pub(crate) fn stop(self) -> bool {
        self.token.cancel();
        if let Some(thread) = *self.thread.lock() {
            if let Err(e) = pthread_kill(thread, WAKE_SIGNAL) {
                debug!("wake-signal delivery failed: {e}");
            }
        }
        self.join.join().is_ok()
    }
}
