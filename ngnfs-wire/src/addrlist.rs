// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::{Endpoint, Error};

/// The maximum number of endpoints a single map may hold. Exceeding it is a
/// configuration mistake, not a runtime condition, so `append` rejects it
/// outright.
pub const MAX_ADDRS: usize = u8::MAX as usize;

/// A builder for the endpoint list backing a map, used while assembling a map
/// from configuration or command-line arguments before it's published.
#[derive(Debug, Default, Clone)]
pub struct AddressList {
    addrs: Vec<Endpoint>,
}

impl AddressList {
    pub fn new() -> Self {
        Self { addrs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Parse `text` as `"addr:port"` and append it. Fails with `InvalidArg`
    /// if the list is already at `MAX_ADDRS` or the text doesn't parse.
    pub fn append(&mut self, text: &str) -> Result<(), Error> {
        if self.addrs.len() >= MAX_ADDRS {
            return Err(Error::InvalidArg(format!(
                "address list already holds the maximum of {MAX_ADDRS} entries"
            )));
        }
        let endpoint: Endpoint = text.parse()?;
        self.addrs.push(endpoint);
        Ok(())
    }

    /// Drop every entry, returning the list to empty.
    pub fn free(&mut self) {
        self.addrs.clear();
    }

    pub fn as_slice(&self) -> &[Endpoint] {
        &self.addrs
    }

    pub fn into_vec(self) -> Vec<Endpoint> {
        self.addrs
    }
}
