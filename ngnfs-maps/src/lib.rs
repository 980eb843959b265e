// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Client and server halves of the cluster map protocol, built on top of
//! [`ngnfs_transport`] for wire I/O and [`ngnfs_mapstore`] for the
//! published-map cell.

mod client;
mod server;

pub use client::{request_and_wait, MapClient, DEFAULT_REQUEST_TIMEOUT};
pub use server::MapServer;
