// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::io;
use std::net::{SocketAddr, TcpStream};

use ngnfs_wire::{Endpoint, Error};

use crate::descriptor::{MessageDescriptor, MessageType};
use crate::framed::{ClonableStream, FramedTransport};
use crate::{Handler, Transport};

impl ClonableStream for TcpStream {
    fn try_clone_stream(&self) -> io::Result<Self> {
        self.try_clone()
    }
}

fn endpoint_of(addr: SocketAddr) -> Endpoint {
    match addr {
        SocketAddr::V4(v4) => Endpoint::new(*v4.ip(), v4.port()),
        SocketAddr::V6(_) => Endpoint::new(std::net::Ipv4Addr::UNSPECIFIED, addr.port()),
    }
}

/// A [`Transport`] over a connected TCP stream.
pub struct TcpTransport {
    inner: FramedTransport<TcpStream>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer = endpoint_of(stream.peer_addr()?);
        Ok(Self {
            inner: FramedTransport::new(stream, peer)?,
        })
    }

    pub fn connect(peer: Endpoint) -> io::Result<Self> {
        let stream = TcpStream::connect((peer.addr, peer.port))?;
        Self::new(stream)
    }
}

impl Transport for TcpTransport {
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
