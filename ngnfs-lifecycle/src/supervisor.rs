// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;
use std::thread;

use log::info;
use nix::sys::signal::{SigSet, Signal};

use ngnfs_fsinfo::FsInfo;

/// Blocks the signals this crate handles on the calling thread and every
/// thread it spawns afterward. Call this once, before spawning any other
/// thread, so only the dedicated signal-watcher thread (started by
/// [`run_supervisor`]) ever has them unblocked enough to `sigwait` on.
pub fn block_process_signals() -> SigSet {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.add(Signal::SIGHUP);
    mask.thread_block().expect("blocking signals on the main thread should never fail");
    mask
}

/// Run `monitor` under a signal supervisor: a dedicated thread that
/// synchronously accepts SIGINT/SIGTERM/SIGHUP (which [`block_process_signals`]
/// must already have blocked process-wide) and turns each one into a
/// shutdown request, forever, until the process exits. `monitor` itself runs
/// on its own thread so this function can join it while the signal watcher
/// keeps running in the background.
///
/// Returns the process's latched error code, suitable for use as an exit
/// status.
pub fn run_supervisor<F>(mask: SigSet, fsinfo: Arc<FsInfo>, monitor: F) -> i32
where
    F: FnOnce(Arc<FsInfo>) + Send + 'static,
{
    spawn_signal_watcher(mask, Arc::clone(&fsinfo));

    let monitor_fsinfo = Arc::clone(&fsinfo);
    let handle = thread::spawn(move || monitor(monitor_fsinfo));
    let _ = handle.join();

    fsinfo.global_errno()
}

/// Spawn the background thread that waits for a blocked signal to arrive
/// and requests a shutdown each time one does. Detached: it runs for the
/// rest of the process's life, which is fine since `sigwait` only consumes
/// CPU while actually blocked.
fn spawn_signal_watcher(mask: SigSet, fsinfo: Arc<FsInfo>) {
    thread::spawn(move || loop {
        match mask.wait() {
            Ok(signal) => {
                info!("received signal {signal:?}, requesting shutdown");
                fsinfo.shutdown(0);
            }
            Err(e) => {
                info!("signal wait failed, stopping signal watcher: {e}");
                return;
            }
        }
    });
}
