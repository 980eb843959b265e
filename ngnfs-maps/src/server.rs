// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;

use ngnfs_transport::{MessageDescriptor, MessageType, Transport};
use ngnfs_wire::{log_operation_error, AddressList, DevdMap, Error, GetMaps, GetMapsResult, Map};

/// The server side of the map protocol: answers every `GET_MAPS` request
/// with the single map this server was configured to serve.
///
/// Today's protocol only has one map (`map_id` is always zero and is
/// ignored), so the server is configured with exactly one [`Map`] at setup
/// time rather than holding a registry of maps by id.
pub struct MapServer {
    map: Map,
    transport: Arc<dyn Transport>,
}

impl MapServer {
    /// Build the map to serve from `addrs` and register the `GET_MAPS`
    /// handler on `transport`.
    pub fn setup(transport: Arc<dyn Transport>, addrs: AddressList) -> Result<Arc<Self>, Error> {
        let map = Map::new(DevdMap::from(addrs))?;
        let server = Arc::new(Self {
            map,
            transport: Arc::clone(&transport),
        });

        let handler_server = Arc::clone(&server);
        transport.register_recv(
            MessageType::GetMaps,
            Arc::new(move |descriptor| handler_server.handle_get_maps(descriptor)),
        )?;

        Ok(server)
    }

    /// Unregister the `GET_MAPS` handler.
    pub fn destroy(&self) {
        self.transport.unregister_recv(MessageType::GetMaps);
    }

    fn handle_get_maps(&self, descriptor: MessageDescriptor) {
        let mut request = GetMaps::default();
        let response = match request.deserialize(&mut descriptor.control.as_slice()) {
            Ok(()) => GetMapsResult::ok(self.map.devd_map().clone()),
            Err(e) => {
                log_operation_error("decoding map request", &e);
                GetMapsResult::err(e.to_wire_errno())
            }
        };

        let reply = MessageDescriptor::new(MessageType::GetMapsResult, descriptor.peer, response.serialize_alloc());
        if let Err(e) = self.transport.send(reply) {
            log_operation_error("sending map result", &e);
        }
    }
}
