// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::Error;

/// An IPv4 address and port, stored little-endian on the wire and in host
/// order in memory. Value object; no identity beyond its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            addr: Ipv4Addr::UNSPECIFIED,
            port: 0,
        }
    }
}

impl Endpoint {
    pub const WIRE_SIZE: usize = 4 + 2;

    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }

    /// Append this endpoint's little-endian wire encoding to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&u32::from(self.addr).to_le_bytes());
        buf.extend_from_slice(&self.port.to_le_bytes());
    }

    /// Decode one endpoint from the front of `input`, advancing it past the
    /// consumed bytes.
    pub fn decode(input: &mut &[u8]) -> Result<Self, Error> {
        if input.len() < Self::WIRE_SIZE {
            return Err(Error::Protocol("truncated endpoint".into()));
        }
        let (addr_bytes, rest) = input.split_at(4);
        let (port_bytes, rest) = rest.split_at(2);
        *input = rest;

        let addr = Ipv4Addr::from(u32::from_le_bytes(addr_bytes.try_into().unwrap()));
        let port = u16::from_le_bytes(port_bytes.try_into().unwrap());

        Ok(Self { addr, port })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Parse `"addr:port"` into an endpoint. Fails with `InvalidArg` if the
    /// text is malformed.
    fn from_str(s: &str) -> Result<Self, Error> {
        let (addr_str, port_str) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidArg(format!("missing ':' in endpoint {s:?}")))?;

        let addr: Ipv4Addr = addr_str
            .parse()
            .map_err(|_| Error::InvalidArg(format!("bad IPv4 address in {s:?}")))?;
        let port: u16 = port_str
            .parse()
            .map_err(|_| Error::InvalidArg(format!("bad port in {s:?}")))?;

        Ok(Self { addr, port })
    }
}
