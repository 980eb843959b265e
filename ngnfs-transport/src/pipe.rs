// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::io;
use std::os::fd::OwnedFd;

use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};

use ngnfs_wire::{Endpoint, Error};

use crate::descriptor::{MessageDescriptor, MessageType};
use crate::framed::{ClonableStream, FramedTransport};
use crate::{Handler, Transport};

/// One end of an in-process `socketpair(2)` connection.
pub struct PipeEndpoint {
    fd: OwnedFd,
}

impl io::Read for PipeEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(nix::unistd::read(&self.fd, buf)?)
    }
}

impl io::Write for PipeEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(nix::unistd::write(&self.fd, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ClonableStream for PipeEndpoint {
    fn try_clone_stream(&self) -> io::Result<Self> {
        let fd = nix::unistd::dup(&self.fd)?;
        Ok(Self { fd })
    }
}

/// A [`Transport`] backed by a `socketpair(2)` pair, for tests that want a
/// real `Transport` without binding a listening socket.
pub struct PipeTransport {
    inner: FramedTransport<PipeEndpoint>,
}

impl PipeTransport {
    /// Build a connected pair of pipe transports. Since there's no real peer
    /// address, both sides report `placeholder` as their peer endpoint.
    pub fn pair(placeholder: Endpoint) -> io::Result<(Self, Self)> {
        let (a, b) = socketpair(
            AddressFamily::Unix,
            SockType::Stream,
            None,
            SockFlag::empty(),
        )?;

        let a = PipeEndpoint { fd: a };
        let b = PipeEndpoint { fd: b };

        Ok((
            Self {
                inner: FramedTransport::new(a, placeholder)?,
            },
            Self {
                inner: FramedTransport::new(b, placeholder)?,
            },
        ))
    }
}

impl Transport for PipeTransport {
    fn register_recv(&self, message_type: MessageType, handler: Handler) -> Result<(), Error> {
        self.inner.register_recv(message_type, handler)
    }

    fn unregister_recv(&self, message_type: MessageType) {
        self.inner.unregister_recv(message_type);
    }

    fn send(&self, descriptor: MessageDescriptor) -> Result<(), Error> {
        self.inner.send(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngnfs_wire::{GetMaps, GetMapsResult};
    use std::net::Ipv4Addr;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    fn placeholder() -> Endpoint {
        Endpoint::new(Ipv4Addr::LOCALHOST, 0)
    }

    #[test]
    fn request_response_round_trip_over_pipe() {
        let (client, server) = PipeTransport::pair(placeholder()).unwrap();

        let (tx, rx) = mpsc::channel();
        server.register_recv(
            MessageType::GetMaps,
            Arc::new(move |descriptor: MessageDescriptor| {
                let mut req = GetMaps::default();
                req.deserialize(&mut descriptor.control.as_slice()).unwrap();
                assert_eq!(req.map_id, 0);

                let result = GetMapsResult::ok(ngnfs_wire::DevdMap::default());
                tx.send(result.serialize_alloc()).unwrap();
            }),
        )
        .unwrap();

        let (reply_tx, reply_rx) = mpsc::channel();
        client
            .register_recv(
                MessageType::GetMapsResult,
                Arc::new(move |descriptor: MessageDescriptor| {
                    reply_tx.send(descriptor.control).unwrap();
                }),
            )
            .unwrap();

        let request = GetMaps { map_id: 0 };
        client
            .send(MessageDescriptor::new(
                MessageType::GetMaps,
                placeholder(),
                request.serialize_alloc(),
            ))
            .unwrap();

        let response_bytes = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        server
            .send(MessageDescriptor::new(
                MessageType::GetMapsResult,
                placeholder(),
                response_bytes,
            ))
            .unwrap();

        let received = reply_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let mut result = GetMapsResult::default();
        result.deserialize_exact(&received).unwrap();
        assert!(!result.is_err());
    }

    #[test]
    fn unregister_stops_dispatch() {
        let (client, server) = PipeTransport::pair(placeholder()).unwrap();

        let (tx, rx) = mpsc::channel::<()>();
        server
            .register_recv(
                MessageType::GetMaps,
                Arc::new(move |_descriptor| {
                    tx.send(()).unwrap();
                }),
            )
            .unwrap();
        server.unregister_recv(MessageType::GetMaps);

        let request = GetMaps { map_id: 0 };
        client
            .send(MessageDescriptor::new(
                MessageType::GetMaps,
                placeholder(),
                request.serialize_alloc(),
            ))
            .unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn registering_a_second_handler_for_the_same_type_is_rejected() {
        let (_client, server) = PipeTransport::pair(placeholder()).unwrap();

        server
            .register_recv(MessageType::GetMaps, Arc::new(|_descriptor| {}))
            .unwrap();
        assert!(server
            .register_recv(MessageType::GetMaps, Arc::new(|_descriptor| {}))
            .is_err());

        server.unregister_recv(MessageType::GetMaps);
        server
            .register_recv(MessageType::GetMaps, Arc::new(|_descriptor| {}))
            .unwrap();
    }
}
