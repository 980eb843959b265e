// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use ngnfs_fsinfo::FsInfo;
use ngnfs_maps::{request_and_wait, MapClient, MapServer};
use ngnfs_transport::{PipeTransport, Transport};
use ngnfs_wire::{AddressList, Endpoint};

fn placeholder() -> Endpoint {
    Endpoint::new(Ipv4Addr::LOCALHOST, 0)
}

#[test]
fn client_fetches_the_map_a_real_server_serves() {
    let (client_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
    let client_transport: Arc<dyn Transport> = Arc::new(client_transport);
    let server_transport: Arc<dyn Transport> = Arc::new(server_transport);

    let mut addrs = AddressList::new();
    addrs.append("10.0.0.1:2049").unwrap();
    addrs.append("10.0.0.2:2049").unwrap();
    let server = MapServer::setup(server_transport, addrs).unwrap();

    let fsinfo = Arc::new(FsInfo::new());
    let client = MapClient::setup(client_transport, fsinfo).unwrap();

    let map = request_and_wait(&client, placeholder(), Some(Duration::from_secs(5))).unwrap();
    assert_eq!(map.nr_addrs(), 2);
    assert_eq!(client.lookup(0).unwrap(), Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 2049));
    assert_eq!(client.lookup(1).unwrap(), Endpoint::new(Ipv4Addr::new(10, 0, 0, 2), 2049));

    client.destroy();
    server.destroy();
}

#[test]
fn two_clients_can_share_one_server() {
    let (client_a_transport, server_transport) = PipeTransport::pair(placeholder()).unwrap();
    let (client_b_transport, server_b_transport) = PipeTransport::pair(placeholder()).unwrap();
    let client_a_transport: Arc<dyn Transport> = Arc::new(client_a_transport);
    let client_b_transport: Arc<dyn Transport> = Arc::new(client_b_transport);
    let server_transport: Arc<dyn Transport> = Arc::new(server_transport);
    let server_b_transport: Arc<dyn Transport> = Arc::new(server_b_transport);

    let mut addrs = AddressList::new();
    addrs.append("10.0.0.9:2049").unwrap();
    let server = MapServer::setup(server_transport, addrs.clone()).unwrap();
    let server_b = MapServer::setup(server_b_transport, addrs).unwrap();

    let fsinfo_a = Arc::new(FsInfo::new());
    let client_a = MapClient::setup(client_a_transport, fsinfo_a).unwrap();
    let fsinfo_b = Arc::new(FsInfo::new());
    let client_b = MapClient::setup(client_b_transport, fsinfo_b).unwrap();

    let map_a = request_and_wait(&client_a, placeholder(), Some(Duration::from_secs(5))).unwrap();
    let map_b = request_and_wait(&client_b, placeholder(), Some(Duration::from_secs(5))).unwrap();
    assert_eq!(map_a.nr_addrs(), 1);
    assert_eq!(map_b.nr_addrs(), 1);

    client_a.destroy();
    client_b.destroy();
    server.destroy();
    server_b.destroy();
}
