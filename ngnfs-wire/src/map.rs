// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::{DevdMap, Endpoint, Error};

/// An immutable, published map: the endpoint list a block number is hashed
/// against to find the device that owns it.
///
/// This is the value type that gets published through the map store; once
/// built it never changes, which is what lets readers observe it without
/// taking a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    devd_map: DevdMap,
}

impl Map {
    /// Build a map from a device map, rejecting an empty address list: a map
    /// with nothing in it can never answer a lookup.
    pub fn new(devd_map: DevdMap) -> Result<Self, Error> {
        if devd_map.is_empty() {
            return Err(Error::InvalidArg("map must have at least one address".into()));
        }
        Ok(Self { devd_map })
    }

    pub fn devd_map(&self) -> &DevdMap {
        &self.devd_map
    }

    pub fn nr_addrs(&self) -> u64 {
        self.devd_map.nr_addrs()
    }

    /// Map a block number to the endpoint that owns it: `bnr % nr_addrs`.
    pub fn map_block(&self, bnr: u64) -> Endpoint {
        let nr_addrs = self.devd_map.addrs.len() as u64;
        debug_assert!(nr_addrs > 0, "Map::new guarantees a nonempty address list");
        let index = (bnr % nr_addrs) as usize;
        self.devd_map.addrs[index]
    }
}
