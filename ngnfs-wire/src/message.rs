// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::{DevdMap, Error};

/// A request for the map identified by `map_id`. Only one map exists today
/// (`map_id` is always zero), but the field is carried on the wire so a
/// future multi-map server doesn't need a format break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetMaps {
    pub map_id: u64,
}

impl GetMaps {
    pub fn serialize_alloc(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        buf.extend_from_slice(&self.map_id.to_le_bytes());
        buf
    }

    pub fn deserialize(&mut self, input: &mut &[u8]) -> Result<(), Error> {
        if input.len() < 8 {
            return Err(Error::Protocol("truncated GET_MAPS".into()));
        }
        let (map_id_bytes, rest) = input.split_at(8);
        self.map_id = u64::from_le_bytes(map_id_bytes.try_into().unwrap());
        *input = rest;
        Ok(())
    }
}

/// The response to a [`GetMaps`] request.
///
/// `err` is a negative errno on failure, zero on success. A negative `err`
/// must carry an empty `devd_map`; a handler that builds one any other way
/// is buggy and `deserialize` refuses to accept it off the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetMapsResult {
    pub err: i32,
    pub devd_map: DevdMap,
}

impl GetMapsResult {
    /// Build a failure result carrying `err` (which must be negative) and no
    /// addresses.
    pub fn err(err: i32) -> Self {
        debug_assert!(err < 0, "GetMapsResult::err requires a negative errno");
        Self {
            err,
            devd_map: DevdMap::default(),
        }
    }

    /// Build a success result carrying `devd_map`.
    pub fn ok(devd_map: DevdMap) -> Self {
        Self { err: 0, devd_map }
    }

    pub fn is_err(&self) -> bool {
        self.err < 0
    }

    pub fn serialize_alloc(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + 8);
        buf.extend_from_slice(&self.err.to_le_bytes());
        self.devd_map.encode(&mut buf);
        buf
    }

    pub fn deserialize(&mut self, input: &mut &[u8]) -> Result<(), Error> {
        if input.len() < 4 {
            return Err(Error::Protocol("truncated GET_MAPS_RESULT".into()));
        }
        let (err_bytes, rest) = input.split_at(4);
        let err = i32::from_le_bytes(err_bytes.try_into().unwrap());
        *input = rest;

        let devd_map = DevdMap::decode(input)?;

        if err < 0 && !devd_map.is_empty() {
            return Err(Error::Protocol(
                "GET_MAPS_RESULT carries a negative err alongside a nonempty devd_map".into(),
            ));
        }

        self.err = err;
        self.devd_map = devd_map;
        Ok(())
    }

    /// Validate that the remaining buffer length exactly matches what was
    /// consumed: a caller that over-reads its declared message length into
    /// this decode should catch the leftover bytes here.
    pub fn deserialize_exact(&mut self, mut input: &[u8]) -> Result<(), Error> {
        self.deserialize(&mut input)?;
        if !input.is_empty() {
            return Err(Error::Protocol(format!(
                "{} trailing bytes after GET_MAPS_RESULT",
                input.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Endpoint;
    use std::net::Ipv4Addr;

    #[test]
    fn get_maps_round_trip() {
        let msg = GetMaps { map_id: 7 };
        let bytes = msg.serialize_alloc();

        let mut decoded = GetMaps::default();
        decoded.deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn get_maps_result_ok_round_trip() {
        let devd_map = DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 2049)]);
        let msg = GetMapsResult::ok(devd_map.clone());
        let bytes = msg.serialize_alloc();

        let mut decoded = GetMapsResult::default();
        decoded.deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);
        assert!(!decoded.is_err());
    }

    #[test]
    fn get_maps_result_err_round_trip() {
        let msg = GetMapsResult::err(-12);
        let bytes = msg.serialize_alloc();

        let mut decoded = GetMapsResult::default();
        decoded.deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);
        assert!(decoded.is_err());
        assert!(decoded.devd_map.is_empty());
    }

    #[test]
    fn deserialize_rejects_err_with_addrs() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-12i32).to_le_bytes());
        DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 1)]).encode(&mut buf);

        let mut decoded = GetMapsResult::default();
        assert!(decoded.deserialize(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn deserialize_exact_rejects_trailing_bytes() {
        let devd_map = DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 1)]);
        let msg = GetMapsResult::ok(devd_map);
        let mut bytes = msg.serialize_alloc();
        bytes.push(0xff);

        let mut decoded = GetMapsResult::default();
        assert!(decoded.deserialize_exact(&bytes).is_err());
    }
}
