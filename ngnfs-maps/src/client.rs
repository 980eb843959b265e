// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use ngnfs_fsinfo::FsInfo;
use ngnfs_mapstore::MapStore;
use ngnfs_transport::{MessageDescriptor, MessageType, Transport};
use ngnfs_wire::{log_operation_error, Endpoint, Error, GetMaps, GetMapsResult, Map};

/// How long `request_and_wait` blocks for a server's reply before giving up.
/// A filesystem client that never hears back from an unreachable map server
/// deserves an error, not a wedged thread.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The client side of the map protocol: sends `GET_MAPS` requests and
/// publishes whatever `GET_MAPS_RESULT` comes back into a [`MapStore`].
pub struct MapClient {
    store: MapStore,
    fsinfo: Arc<FsInfo>,
    transport: Arc<dyn Transport>,
}

impl MapClient {
    /// Register the `GET_MAPS_RESULT` handler on `transport` and return a
    /// ready-to-use client. Call [`MapClient::destroy`] before dropping the
    /// transport. Fails if `transport` already has a `GET_MAPS_RESULT`
    /// handler registered.
    pub fn setup(transport: Arc<dyn Transport>, fsinfo: Arc<FsInfo>) -> Result<Arc<Self>, Error> {
        let client = Arc::new(Self {
            store: MapStore::new(),
            fsinfo,
            transport: Arc::clone(&transport),
        });

        let handler_client = Arc::clone(&client);
        transport.register_recv(
            MessageType::GetMapsResult,
            Arc::new(move |descriptor| handler_client.handle_get_maps_result(descriptor)),
        )?;

        Ok(client)
    }

    /// Unregister the `GET_MAPS_RESULT` handler. After this call no more
    /// results will be published, even if the transport is still alive.
    pub fn destroy(&self) {
        self.transport.unregister_recv(MessageType::GetMapsResult);
    }

    fn handle_get_maps_result(&self, descriptor: MessageDescriptor) {
        let mut result = GetMapsResult::default();
        if let Err(e) = result.deserialize_exact(&descriptor.control) {
            log_operation_error("decoding map result", &e);
            self.fsinfo.shutdown(e.to_wire_errno());
            return;
        }

        if result.is_err() {
            let e = Error::from_wire_errno(result.err);
            log_operation_error("server reported map error", &e);
            self.fsinfo.shutdown(result.err);
            return;
        }

        match Map::new(result.devd_map) {
            Ok(map) => {
                self.store.publish(map);
                info!("map received");
            }
            Err(e) => {
                log_operation_error("publishing received map", &e);
                self.fsinfo.shutdown(e.to_wire_errno());
            }
        }
    }

    /// Send a request for the map to `server`. Doesn't wait for the reply;
    /// pair with [`MapClient::wait_until_ready`] or [`request_and_wait`].
    pub fn request_maps(&self, server: Endpoint) -> Result<(), Error> {
        let request = GetMaps { map_id: 0 };
        self.transport.send(MessageDescriptor::new(
            MessageType::GetMaps,
            server,
            request.serialize_alloc(),
        ))
    }

    /// Map a block number using whatever map has been published so far.
    pub fn lookup(&self, bnr: u64) -> Result<Endpoint, Error> {
        self.store.lookup(bnr)
    }

    /// Block until a map has been published, a shutdown is requested, or
    /// `timeout` elapses.
    ///
    /// A shutdown triggered by a server-reported error surfaces that error's
    /// decoded kind here, not the generic [`Error::Shutdown`] — the latched
    /// `global_errno` is the only place that kind survives once the handler
    /// that saw it has returned.
    pub fn wait_until_ready(&self, timeout: Option<Duration>) -> Result<Arc<Map>, Error> {
        self.store.wait_until_nonempty(&self.fsinfo, timeout).map_err(|e| {
            if matches!(e, Error::Shutdown) {
                let errno = self.fsinfo.global_errno();
                if errno != 0 {
                    return Error::from_wire_errno(errno);
                }
            }
            e
        })
    }
}

/// Request the map from `server` and block for it, using
/// [`DEFAULT_REQUEST_TIMEOUT`] if `timeout` is `None`.
pub fn request_and_wait(client: &MapClient, server: Endpoint, timeout: Option<Duration>) -> Result<Arc<Map>, Error> {
    client.request_maps(server)?;
    client.wait_until_ready(Some(timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngnfs_transport::PipeTransport;
    use ngnfs_wire::DevdMap;
    use std::net::Ipv4Addr;
    use std::thread;

    fn placeholder() -> Endpoint {
        Endpoint::new(Ipv4Addr::LOCALHOST, 0)
    }

    #[test]
    fn request_and_wait_round_trips_through_a_manual_server() {
        let (client_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
        let client_transport: Arc<dyn Transport> = Arc::new(client_transport);
        let server_transport: Arc<dyn Transport> = Arc::new(server_transport);

        let reply_transport = Arc::clone(&server_transport);
        server_transport.register_recv(
            MessageType::GetMaps,
            Arc::new(move |descriptor: MessageDescriptor| {
                let devd_map = DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 2049)]);
                let result = GetMapsResult::ok(devd_map);
                reply_transport
                    .send(MessageDescriptor::new(
                        MessageType::GetMapsResult,
                        descriptor.peer,
                        result.serialize_alloc(),
                    ))
                    .unwrap();
            }),
        )
        .unwrap();

        let fsinfo = Arc::new(FsInfo::new());
        let client = MapClient::setup(client_transport, fsinfo).unwrap();

        let map = request_and_wait(&client, placeholder(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(map.map_block(0), Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 2049));
        assert_eq!(client.lookup(0).unwrap(), Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 2049));
    }

    #[test]
    fn server_error_result_shuts_down_the_client() {
        let (client_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
        let client_transport: Arc<dyn Transport> = Arc::new(client_transport);
        let server_transport: Arc<dyn Transport> = Arc::new(server_transport);

        let reply_transport = Arc::clone(&server_transport);
        server_transport.register_recv(
            MessageType::GetMaps,
            Arc::new(move |descriptor: MessageDescriptor| {
                let result = GetMapsResult::err(-22);
                reply_transport
                    .send(MessageDescriptor::new(
                        MessageType::GetMapsResult,
                        descriptor.peer,
                        result.serialize_alloc(),
                    ))
                    .unwrap();
            }),
        )
        .unwrap();

        let fsinfo = Arc::new(FsInfo::new());
        let client = MapClient::setup(client_transport, Arc::clone(&fsinfo)).unwrap();

        let result = request_and_wait(&client, placeholder(), Some(Duration::from_secs(5)));
        assert!(matches!(result, Err(Error::InvalidArg(_))));
        assert_eq!(fsinfo.global_errno(), -22);
    }

    #[test]
    fn out_of_memory_result_is_decoded_for_the_caller() {
        let (client_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
        let client_transport: Arc<dyn Transport> = Arc::new(client_transport);
        let server_transport: Arc<dyn Transport> = Arc::new(server_transport);

        let reply_transport = Arc::clone(&server_transport);
        server_transport.register_recv(
            MessageType::GetMaps,
            Arc::new(move |descriptor: MessageDescriptor| {
                let result = GetMapsResult::err(-12);
                reply_transport
                    .send(MessageDescriptor::new(
                        MessageType::GetMapsResult,
                        descriptor.peer,
                        result.serialize_alloc(),
                    ))
                    .unwrap();
            }),
        )
        .unwrap();

        let fsinfo = Arc::new(FsInfo::new());
        let client = MapClient::setup(client_transport, fsinfo).unwrap();

        let result = request_and_wait(&client, placeholder(), Some(Duration::from_secs(5)));
        assert!(matches!(result, Err(Error::NoMemory)));
    }

    #[test]
    fn wait_times_out_if_no_request_is_ever_answered() {
        let (client_transport, _server_transport) = PipeTransport::pair(placeholder()).unwrap();
        let client_transport: Arc<dyn Transport> = Arc::new(client_transport);

        let fsinfo = Arc::new(FsInfo::new());
        let client = MapClient::setup(client_transport, fsinfo).unwrap();

        let result = client.wait_until_ready(Some(Duration::from_millis(30)));
        assert!(matches!(result, Err(Error::TimedOut)));
    }

    #[test]
    fn destroy_stops_publishing_further_results() {
        let (client_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
        let client_transport: Arc<dyn Transport> = Arc::new(client_transport);
        let server_transport: Arc<dyn Transport> = Arc::new(server_transport);

        let fsinfo = Arc::new(FsInfo::new());
        let client = MapClient::setup(client_transport, fsinfo).unwrap();
        client.destroy();

        let devd_map = DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 1)]);
        let result = GetMapsResult::ok(devd_map);
        server_transport
            .send(MessageDescriptor::new(
                MessageType::GetMapsResult,
                placeholder(),
                result.serialize_alloc(),
            ))
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(client.lookup(0).is_err());
    }
}
