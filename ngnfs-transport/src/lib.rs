// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! A small message-oriented transport facade: handlers register for a
//! [`MessageType`] and are invoked on a transport-owned thread as framed
//! messages arrive; `send` writes a framed message to the peer.
//!
//! Two concrete transports are provided: [`TcpTransport`] for real network
//! use, and [`PipeTransport`] (a `socketpair(2)` pair) for in-process tests
//! that want a real `Transport` without a listening socket.

mod descriptor;
mod framed;
mod pipe;
mod tcp;

pub use descriptor::{MessageDescriptor, MessageType};
pub use pipe::PipeTransport;
pub use tcp::TcpTransport;

use ngnfs_wire::Error;

/// A handler for inbound messages of one [`MessageType`]. Invoked on the
/// transport's dispatch thread, so it must not block: a handler that needs
/// to do blocking work should hand off to a worker thread instead.
///
/// `Arc`-wrapped rather than `Box`-wrapped so the dispatch loop can clone a
/// handler out of the registry and invoke it without holding the registry
/// lock, which would otherwise deadlock a handler that registers or
/// unregisters another handler.
pub type Handler = std::sync::Arc<dyn Fn(MessageDescriptor) + Send + Sync>;

/// The facade every protocol layer above this crate programs against.
///
/// At most one handler may be registered per [`MessageType`] at a time;
/// registering a second one for a type that already has a handler is
/// rejected rather than silently replacing it, since two registrants
/// racing for the same message type is almost always a setup bug.
pub trait Transport: Send + Sync {
    /// Register `handler` to be invoked for every inbound message of
    /// `message_type`. Fails if a handler is already registered for that
    /// type; call [`Transport::unregister_recv`] first to replace one.
    fn register_recv(&self, message_type: MessageType, handler: Handler) -> Result<(), Error>;

    /// Stop invoking any handler for `message_type`.
    fn unregister_recv(&self, message_type: MessageType);

    /// Send `descriptor` to its peer. Blocks locally until the write
    /// completes; a network transport may complete the underlying I/O
    /// asynchronously on its own thread, but `send` returns as soon as the
    /// descriptor has been handed off for sending.
    fn send(&self, descriptor: MessageDescriptor) -> Result<(), Error>;
}
