// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::{AddressList, Endpoint, Error};

/// The wire representation of a device map: a count followed by that many
/// endpoints. `nr_addrs` is carried as a 64-bit field on the wire even though
/// no map ever holds more than [`crate::addrlist::MAX_ADDRS`] entries, to
/// leave room on the wire for future growth without a format break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevdMap {
    pub addrs: Vec<Endpoint>,
}

impl DevdMap {
    pub fn new(addrs: Vec<Endpoint>) -> Self {
        Self { addrs }
    }

    pub fn nr_addrs(&self) -> u64 {
        self.addrs.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Append this map's little-endian wire encoding to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.nr_addrs().to_le_bytes());
        for addr in &self.addrs {
            addr.encode(buf);
        }
    }

    /// Decode a device map from the front of `input`, advancing it past the
    /// consumed bytes. Rejects a declared count that exceeds the number of
    /// bytes actually remaining, and a count above the address list's cap.
    pub fn decode(input: &mut &[u8]) -> Result<Self, Error> {
        if input.len() < 8 {
            return Err(Error::Protocol("truncated devd_map count".into()));
        }
        let (count_bytes, rest) = input.split_at(8);
        let nr_addrs = u64::from_le_bytes(count_bytes.try_into().unwrap());
        *input = rest;

        if nr_addrs as usize > crate::addrlist::MAX_ADDRS {
            return Err(Error::Protocol(format!(
                "devd_map declares {nr_addrs} addresses, more than the {} allowed",
                crate::addrlist::MAX_ADDRS
            )));
        }

        let needed = nr_addrs as usize * Endpoint::WIRE_SIZE;
        if input.len() < needed {
            return Err(Error::Protocol(format!(
                "devd_map declares {nr_addrs} addresses but only {} bytes remain",
                input.len()
            )));
        }

        let mut addrs = Vec::with_capacity(nr_addrs as usize);
        for _ in 0..nr_addrs {
            addrs.push(Endpoint::decode(input)?);
        }

        Ok(Self { addrs })
    }
}

impl From<AddressList> for DevdMap {
    fn from(list: AddressList) -> Self {
        Self::new(list.into_vec())
    }
}
