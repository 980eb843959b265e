// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Wire types and codec for the cluster map protocol: the `GET_MAPS` request
//! and its `GET_MAPS_RESULT` reply, plus the value types (`Endpoint`,
//! `DevdMap`, `Map`) they're built from.

pub mod addrlist;
pub mod devdmap;
pub mod endpoint;
pub mod error;
pub mod map;
pub mod message;

pub use addrlist::{AddressList, MAX_ADDRS};
pub use devdmap::DevdMap;
pub use endpoint::Endpoint;
pub use error::{log_operation_error, Error};
pub use map::Map;
pub use message::{GetMaps, GetMapsResult};
