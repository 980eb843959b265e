// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use ngnfs_wire::Endpoint;

/// Identifies which message a descriptor carries. Carried as a `u32` on the
/// wire ahead of the payload; new message types are added here, never by
/// reusing a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    GetMaps,
    GetMapsResult,
}

impl MessageType {
    const GET_MAPS: u32 = 1;
    const GET_MAPS_RESULT: u32 = 2;

    pub(crate) fn to_wire(self) -> u32 {
        match self {
            MessageType::GetMaps => Self::GET_MAPS,
            MessageType::GetMapsResult => Self::GET_MAPS_RESULT,
        }
    }

    pub(crate) fn from_wire(tag: u32) -> Option<Self> {
        match tag {
            Self::GET_MAPS => Some(MessageType::GetMaps),
            Self::GET_MAPS_RESULT => Some(MessageType::GetMapsResult),
            _ => None,
        }
    }
}

/// Everything a receive handler or a `send` call needs: which message this
/// is, who it's from or to, and its payload.
///
/// `control` carries the encoded message body. `data` is reserved for a
/// future message that ships a bulk payload alongside its control bytes;
/// none of today's messages use it, so it is always `None` in practice, but
/// callers still deal with the field so adding one later doesn't change this
/// type's shape.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub message_type: MessageType,
    pub peer: Endpoint,
    pub control: Vec<u8>,
    pub data: Option<Vec<u8>>,
}

impl MessageDescriptor {
    pub fn new(message_type: MessageType, peer: Endpoint, control: Vec<u8>) -> Self {
        Self {
            message_type,
            peer,
            control,
            data: None,
        }
    }
}
