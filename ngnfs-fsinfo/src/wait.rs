// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use ngnfs_wire::Error;

use crate::FsInfo;

/// Wait on `condvar`/`mutex` until `ready` is satisfied, a shutdown is
/// requested, or `deadline` passes, whichever comes first.
///
/// This is the one place the shutdown-polling discipline lives: every
/// blocking wait in the process (a client waiting for its first map, a
/// monitor thread waiting for its worker) goes through this function so a
/// shutdown request is never missed by a thread that's parked on its own,
/// unrelated condition variable. It works by waking periodically (every
/// `poll_interval`, capped by whatever's left of `deadline`) to re-check both
/// `ready` and [`FsInfo::should_shutdown`], rather than requiring every
/// possible wait site to share one condition variable with the shutdown
/// latch.
pub fn wait_shutdown_aware<'a, T, F>(
    fsinfo: &FsInfo,
    mutex: &'a Mutex<T>,
    condvar: &Condvar,
    poll_interval: Duration,
    deadline: Option<Instant>,
    mut ready: F,
) -> Result<MutexGuard<'a, T>, Error>
where
    F: FnMut(&T) -> bool,
{
    let mut guard = mutex.lock().unwrap();
    loop {
        if ready(&guard) {
            return Ok(guard);
        }
        if fsinfo.should_shutdown() {
            return Err(Error::Shutdown);
        }

        let wait_for = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::TimedOut);
                }
                poll_interval.min(deadline - now)
            }
            None => poll_interval,
        };

        let (next_guard, _timeout_result) = condvar.wait_timeout(guard, wait_for).unwrap();
        guard = next_guard;
    }
}
