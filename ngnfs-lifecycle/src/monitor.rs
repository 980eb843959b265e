// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use ngnfs_fsinfo::FsInfo;
use ngnfs_wire::{log_operation_error, Error};

use crate::worker::{block_lifecycle_signals, spawn_worker, WorkerOutcome};

/// How often a monitor's wait loop rechecks the shutdown latch while its
/// worker is still running.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run one subsystem's lifecycle: set up, hand off exactly one blocking
/// operation to a worker thread, wait for either the worker to finish or a
/// shutdown to be requested, and always tear down afterward.
///
/// `setup` and `teardown` run on the monitor thread itself (with signals
/// already blocked by the caller, see [`block_lifecycle_signals`]); `work`
/// runs on a dedicated worker thread so the monitor's wait loop stays
/// responsive to shutdown requests even while `work` is blocked in I/O.
pub fn run_monitor<T, Setup, Work, Teardown>(
    operation_name: &str,
    fsinfo: &Arc<FsInfo>,
    setup: Setup,
    work: Work,
    teardown: Teardown,
) -> Result<T, Error>
where
    T: Send + 'static,
    Setup: FnOnce() -> Result<(), Error>,
    Work: FnOnce() -> Result<T, Error> + Send + 'static,
    Teardown: FnOnce(),
{
    block_lifecycle_signals();

    if let Err(e) = setup() {
        log_operation_error(operation_name, &e);
        teardown();
        return Err(e);
    }

    let outcome = Arc::new(WorkerOutcome::new());
    let handle = spawn_worker(Arc::clone(&outcome), work);

    let result = outcome.wait(fsinfo, DEFAULT_POLL_INTERVAL);
    if result.is_err() {
        debug!("{operation_name} monitor waking on shutdown before its worker finished");
    }

    teardown();
    let _ = handle.join();

    if let Err(ref e) = result {
        log_operation_error(operation_name, e);
    }
    result
}
