// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};
use ngnfs_wire::{Endpoint, Error};

use crate::descriptor::{MessageDescriptor, MessageType};
use crate::{Handler, Transport};

/// A stream half that can be duplicated into an independent handle sharing
/// the same underlying file descriptor, so the reader thread and the writer
/// can each own one without sharing a lock across blocking I/O.
pub trait ClonableStream: Read + Write + Send + 'static {
    fn try_clone_stream(&self) -> io::Result<Self>
    where
        Self: Sized;
}

/// Frames messages on any [`ClonableStream`] as:
/// `[type:u32][control_len:u32][control bytes][data_len:u32][data bytes]`,
/// all fields little-endian. A background thread reads frames and dispatches
/// them to the handler registered for their type; `send` writes a frame to
/// the peer.
pub struct FramedTransport<S: ClonableStream> {
    writer: Mutex<S>,
    peer: Endpoint,
    handlers: Arc<Mutex<HashMap<u32, Handler>>>,
    reader: Option<thread::JoinHandle<()>>,
}

impl<S: ClonableStream> FramedTransport<S> {
    pub fn new(stream: S, peer: Endpoint) -> io::Result<Self> {
        let reader_stream = stream.try_clone_stream()?;
        let handlers: Arc<Mutex<HashMap<u32, Handler>>> = Arc::new(Mutex::new(HashMap::new()));

        let reader_handlers = Arc::clone(&handlers);
        let reader = thread::spawn(move || run_dispatch_loop(reader_stream, peer, reader_handlers));

        Ok(Self {
            writer: Mutex::new(stream),
            peer,
            handlers,
            reader: Some(reader),
        })
    }
}

impl<S: ClonableStream> Transport for FramedTransport<S> {
    fn register_recv(&self, message_type: MessageType, handler: Handler) -> Result<(), Error> {
        use std::collections::hash_map::Entry;

        match self.handlers.lock().unwrap().entry(message_type.to_wire()) {
            Entry::Occupied(_) => Err(Error::InvalidArg(format!(
                "a handler is already registered for message type {message_type:?}"
            ))),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    fn unregister_recv(&self, message_type: MessageType) {
        self.handlers.lock().unwrap().remove(&message_type.to_wire());
    }

    fn send(&self, descriptor: MessageDescriptor) -> Result<(), Error> {
        let mut frame = Vec::with_capacity(8 + descriptor.control.len());
        frame.extend_from_slice(&descriptor.message_type.to_wire().to_le_bytes());
        frame.extend_from_slice(&(descriptor.control.len() as u32).to_le_bytes());
        frame.extend_from_slice(&descriptor.control);

        let data = descriptor.data.unwrap_or_default();
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(&data);

        let mut writer = self.writer.lock().unwrap();
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }
}

impl<S: ClonableStream> Drop for FramedTransport<S> {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            // The reader thread exits on its own once the peer closes or a
            // read fails; we don't have a clean way to interrupt a blocking
            // read, so we only reap it if it's already finished.
            if reader.is_finished() {
                let _ = reader.join();
            }
        }
    }
}

fn run_dispatch_loop<S: Read>(mut stream: S, peer: Endpoint, handlers: Arc<Mutex<HashMap<u32, Handler>>>) {
    loop {
        match read_frame(&mut stream) {
            Ok(Some((tag, control, data))) => {
                let Some(message_type) = MessageType::from_wire(tag) else {
                    warn!("received message with unknown tag {tag}");
                    continue;
                };

                let handler = handlers.lock().unwrap().get(&tag).cloned();
                let Some(handler) = handler else {
                    warn!("received message with tag {tag} and no registered handler");
                    continue;
                };

                let mut descriptor = MessageDescriptor::new(message_type, peer, control);
                descriptor.data = if data.is_empty() { None } else { Some(data) };
                handler(descriptor);
            }
            Ok(None) => {
                debug!("peer {peer} closed the transport");
                return;
            }
            Err(e) => {
                debug!("transport read from {peer} failed: {e}");
                return;
            }
        }
    }
}

/// Read one frame, returning `Ok(None)` on a clean EOF between frames.
fn read_frame<S: Read>(stream: &mut S) -> io::Result<Option<(u32, Vec<u8>, Vec<u8>)>> {
    let mut tag_buf = [0u8; 4];
    match stream.read_exact(&mut tag_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let tag = u32::from_le_bytes(tag_buf);

    let control = read_length_prefixed(stream)?;
    let data = read_length_prefixed(stream)?;

    Ok(Some((tag, control, data)))
}

fn read_length_prefixed<S: Read>(stream: &mut S) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}
