// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{FromRawFd, IntoRawFd};

use nix::sys::wait::waitpid;
use nix::unistd::{fork, pipe, setsid, ForkResult};

use ngnfs_wire::Error;

/// Detach the current process into a daemon and report its startup status
/// back to the original foreground invocation.
///
/// The parent process forks, waits on a pipe for a status code written by
/// the child once it finishes its own setup, and exits with that status (so
/// `mapd --daemonize` doesn't return control to the shell until the daemon
/// is actually ready or has failed). The child closes its read end, starts a
/// new session so it's no longer attached to a controlling terminal, and
/// gets back a [`DaemonReporter`] to send its status once setup completes.
///
/// Returns `Ok(None)` in the parent (which has already exited and will
/// never observe this return value in practice) and `Ok(Some(reporter))` in
/// the child.
pub fn daemonize() -> Result<Option<DaemonReporter>, Error> {
    let (read_fd, write_fd) = pipe().map_err(io::Error::from)?;

    // SAFETY: called before any additional threads are spawned, satisfying
    // fork's async-signal-safety requirement that the child only call
    // async-signal-safe functions until it execs or exits.
    match unsafe { fork() }.map_err(io::Error::from)? {
        ForkResult::Parent { child } => {
            drop(write_fd);
            let mut file = File::from(read_fd);
            let mut status_bytes = [0u8; 4];
            let status = match file.read_exact(&mut status_bytes) {
                Ok(()) => i32::from_le_bytes(status_bytes),
                Err(_) => 1,
            };
            let _ = waitpid(child, None);
            std::process::exit(status);
        }
        ForkResult::Child => {
            drop(read_fd);
            setsid().map_err(io::Error::from)?;
            Ok(Some(DaemonReporter {
                write_fd: write_fd.into_raw_fd(),
            }))
        }
    }
}

/// The child's handle for reporting its startup status back to the parent
/// that's blocked in [`daemonize`].
pub struct DaemonReporter {
    write_fd: std::os::fd::RawFd,
}

impl DaemonReporter {
    /// Report `status` (0 for success) and close the pipe. Consumes `self`
    /// since a status can only be reported once.
    pub fn report(self, status: i32) {
        // SAFETY: `write_fd` came from `into_raw_fd` in `daemonize` and has
        // not been used since.
        let mut file = unsafe { File::from_raw_fd(self.write_fd) };
        let _ = file.write_all(&status.to_le_bytes());
    }
}
