// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

/// The abstract error taxonomy shared by every layer of the map core.
///
/// Handlers never propagate an error up into the transport directly; they
/// latch it via `shutdown(err)` (see `ngnfs-fsinfo`) and let foreground
/// callers surface it from there. This enum is what gets latched.
#[derive(Debug)]
pub enum Error {
    /// Malformed endpoint text, unknown command, or an impossible count.
    InvalidArg(String),

    /// Allocation failure during map construction or message framing.
    NoMemory,

    /// `lookup` was called before any map was ever published.
    NotReady,

    /// Message size or field inconsistency detected on receive.
    Protocol(String),

    /// A bounded wait expired before its condition was satisfied.
    TimedOut,

    /// Observed by a waiter that woke because of `shutdown` rather than
    /// because its own condition was satisfied.
    Shutdown,

    /// A transport send failed.
    Io(std::io::Error),
}

impl Error {
    /// Decode a negative errno-family wire code (as carried by
    /// `GetMapsResult::err`) into the local taxonomy.
    ///
    /// Only the handful of kinds the map core can actually emit on the wire
    /// round-trip back; anything else is reported generically.
    pub fn from_wire_errno(err: i32) -> Self {
        assert!(err < 0, "from_wire_errno called with non-negative code");
        match -err {
            ENOMEM => Error::NoMemory,
            EINVAL => Error::InvalidArg("server reported EINVAL".into()),
            other => Error::Protocol(format!("unrecognized errno {other}")),
        }
    }

    /// Encode this error back onto the wire as a negative errno, for a
    /// server that must report `err` in a `GetMapsResult`.
    pub fn to_wire_errno(&self) -> i32 {
        match self {
            Error::NoMemory => -ENOMEM,
            Error::InvalidArg(_) => -EINVAL,
            _ => -EIO,
        }
    }
}

// Minimal errno constants so this crate doesn't need to pull in `libc` just
// for three integers; the CLI/transport layers that do real syscalls use the
// real `libc`/`nix` crates and these values agree with them on Linux.
const ENOMEM: i32 = 12;
const EINVAL: i32 = 22;
const EIO: i32 = 5;

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg(msg) => write!(f, "invalid argument: {msg}"),
            Error::NoMemory => write!(f, "out of memory"),
            Error::NotReady => write!(f, "map not ready: no map has been published yet"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::TimedOut => write!(f, "timed out"),
            Error::Shutdown => write!(f, "shutdown"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Print a single diagnostic line of the form `<operation> error: <kind>`,
/// as mandated by the user-visible behaviour in the error handling design.
pub fn log_operation_error(operation: &str, err: &Error) {
    eprintln!("{operation} error: {err}");
}
