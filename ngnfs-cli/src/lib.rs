// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Shared plumbing for the `ngnfs` and `mapd` binaries.

use std::sync::Arc;

use ngnfs_transport::{TcpTransport, Transport};
use ngnfs_wire::{Endpoint, Error};

/// Parse `server` as `"addr:port"` and open a transport connection to it.
pub fn connect(server: &str) -> Result<(Arc<dyn Transport>, Endpoint), Error> {
    let endpoint: Endpoint = server.parse()?;
    let transport = TcpTransport::connect(endpoint)?;
    Ok((Arc::new(transport), endpoint))
}

/// Print the mandated `<operation> error: <kind>` diagnostic and return the
/// process exit code for it.
pub fn report_error(operation: &str, err: &Error) -> i32 {
    ngnfs_wire::log_operation_error(operation, err);
    1
}
