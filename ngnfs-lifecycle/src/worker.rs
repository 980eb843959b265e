// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{SigSet, Signal};

use ngnfs_fsinfo::{wait_shutdown_aware, FsInfo};
use ngnfs_wire::Error;

/// Blocks every signal this crate cares about on the calling thread.
///
/// Monitor and worker threads call this as their first action so a delivered
/// signal never interrupts a blocking syscall partway through; only the
/// dedicated signal-supervisor thread (see [`crate::supervisor`]) ever
/// observes one.
pub fn block_lifecycle_signals() {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.add(Signal::SIGHUP);
    mask.thread_block().expect("blocking signals on a new thread should never fail");
}

/// The outcome of exactly one blocking operation run on a worker thread,
/// shared with whoever is waiting for it.
pub struct WorkerOutcome<T> {
    result: Mutex<Option<Result<T, Error>>>,
    cond: Condvar,
}

impl<T> Default for WorkerOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkerOutcome<T> {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(None),
            cond: Condvar::new(),
        }
    }

    /// Report the worker's result and wake anyone waiting on it. Called
    /// exactly once, from the worker thread.
    pub fn complete(&self, result: Result<T, Error>) {
        *self.result.lock().unwrap() = Some(result);
        self.cond.notify_all();
    }

    /// Block until the worker reports a result or a shutdown is requested.
    pub fn wait(&self, fsinfo: &FsInfo, poll_interval: Duration) -> Result<T, Error> {
        let mut guard = wait_shutdown_aware(fsinfo, &self.result, &self.cond, poll_interval, None, |result| {
            result.is_some()
        })?;
        guard.take().expect("ready predicate guarantees Some")
    }
}

/// Spawn a worker thread that blocks signals, runs `operation` exactly once,
/// and reports its result through `outcome`.
pub fn spawn_worker<T, F>(outcome: std::sync::Arc<WorkerOutcome<T>>, operation: F) -> thread::JoinHandle<()>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    thread::spawn(move || {
        block_lifecycle_signals();
        let result = operation();
        outcome.complete(result);
    })
}
