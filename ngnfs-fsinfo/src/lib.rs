// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Process-wide shutdown state: a single place every thread polls to decide
//! whether to keep waiting, plus the first-writer-wins error code that
//! caused the shutdown.

mod wait;

pub use wait::wait_shutdown_aware;

use std::sync::Mutex;

use log::info;

/// Shared shutdown latch. One instance is created at process start and
/// handed (by reference or `Arc`) to every subsystem; any of them can
/// request a shutdown, and every blocking wait in the process polls
/// [`FsInfo::should_shutdown`] so a shutdown request is never silently
/// ignored by a thread parked somewhere else.
///
/// There's no condition variable here for waiters to block on directly: a
/// `Condvar` only ever pairs with one `Mutex`, and waiters are blocked on
/// mutexes this type doesn't own (see [`wait_shutdown_aware`]), so instead
/// they poll [`should_shutdown`](FsInfo::should_shutdown) between waits on
/// their own condition variable.
pub struct FsInfo {
    shutdown: Mutex<bool>,
    global_errno: Mutex<Option<i32>>,
}

impl Default for FsInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl FsInfo {
    pub fn new() -> Self {
        Self {
            shutdown: Mutex::new(false),
            global_errno: Mutex::new(None),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        *self.shutdown.lock().unwrap()
    }

    /// Request a shutdown. `err` is latched as the process's exit error only
    /// the first time a nonzero value is reported; a zero `err` (a clean,
    /// requested shutdown) never overwrites an earlier failure.
    pub fn shutdown(&self, err: i32) {
        if err != 0 {
            let mut global_errno = self.global_errno.lock().unwrap();
            if global_errno.is_none() {
                *global_errno = Some(err);
            }
        }

        let mut shutdown = self.shutdown.lock().unwrap();
        if !*shutdown {
            info!("shutting down, err {err}");
        }
        *shutdown = true;
    }

    /// The latched error code, or zero if shutdown was never requested or
    /// was requested cleanly.
    pub fn global_errno(&self) -> i32 {
        self.global_errno.lock().unwrap().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_instance_is_not_shutting_down() {
        let fsinfo = FsInfo::new();
        assert!(!fsinfo.should_shutdown());
        assert_eq!(fsinfo.global_errno(), 0);
    }

    #[test]
    fn shutdown_latches_first_nonzero_error() {
        let fsinfo = FsInfo::new();
        fsinfo.shutdown(-5);
        fsinfo.shutdown(-9);
        assert!(fsinfo.should_shutdown());
        assert_eq!(fsinfo.global_errno(), -5);
    }

    #[test]
    fn clean_shutdown_does_not_clobber_prior_error() {
        let fsinfo = FsInfo::new();
        fsinfo.shutdown(-5);
        fsinfo.shutdown(0);
        assert_eq!(fsinfo.global_errno(), -5);
    }

    #[test]
    fn clean_shutdown_with_no_prior_error_stays_zero() {
        let fsinfo = FsInfo::new();
        fsinfo.shutdown(0);
        assert!(fsinfo.should_shutdown());
        assert_eq!(fsinfo.global_errno(), 0);
    }
}
