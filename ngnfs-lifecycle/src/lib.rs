// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The three-tier threaded lifecycle shared by every long-running binary:
//! a signal supervisor that translates SIGINT/SIGTERM into a shutdown
//! request, a monitor that sets up and tears down one subsystem, and a
//! worker that runs exactly one blocking operation on the subsystem's
//! behalf.

mod daemon;
mod monitor;
mod supervisor;
mod worker;

pub use daemon::{daemonize, DaemonReporter};
pub use monitor::{run_monitor, DEFAULT_POLL_INTERVAL};
pub use supervisor::{block_process_signals, run_supervisor};
pub use worker::{block_lifecycle_signals, spawn_worker, WorkerOutcome};
