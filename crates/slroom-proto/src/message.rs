//! Room protocol envelopes.
//!
//! Every frame on the wire is a JSON object whose `type` field names the
//! envelope and whose remaining fields carry its data:
//!
//! ```text
//! {"type":"join_room","room_id":"lobby"}
//! {"type":"message","room_id":"lobby","payload":{"text":"hi"}}
//! ```

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A room protocol envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Request to join a room.
    JoinRoom {
        /// Target room identity.
        room_id: String,
    },
    /// Request to leave a room.
    LeaveRoom {
        /// Target room identity.
        room_id: String,
    },
    /// Confirmation that the requester is now a member of the room.
    RoomJoined {
        /// Confirmed room identity.
        room_id: String,
    },
    /// Confirmation that the requester is no longer a member of the room.
    RoomLeft {
        /// Confirmed room identity.
        room_id: String,
    },
    /// Rejection of a join or leave naming a room the server does not know.
    RoomNotFound {
        /// The room identity that could not be resolved.
        room_id: String,
    },
    /// Chat envelope addressed to the members of a room.
    Message {
        /// Room the payload is addressed to.
        room_id: String,
        /// Opaque application payload, relayed untouched.
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// Discriminant of a [`Message`], used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `join_room`
    JoinRoom,
    /// `leave_room`
    LeaveRoom,
    /// `room_joined`
    RoomJoined,
    /// `room_left`
    RoomLeft,
    /// `room_not_found`
    RoomNotFound,
    /// `message`
    Message,
}

impl MessageKind {
    /// The wire tag of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::RoomJoined => "room_joined",
            Self::RoomLeft => "room_left",
            Self::RoomNotFound => "room_not_found",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Build a `join_room` envelope.
    pub fn join_room(room_id: impl Into<String>) -> Self {
        Self::JoinRoom {
            room_id: room_id.into(),
        }
    }

    /// Build a `leave_room` envelope.
    pub fn leave_room(room_id: impl Into<String>) -> Self {
        Self::LeaveRoom {
            room_id: room_id.into(),
        }
    }

    /// Build a `room_joined` envelope.
    pub fn room_joined(room_id: impl Into<String>) -> Self {
        Self::RoomJoined {
            room_id: room_id.into(),
        }
    }

    /// Build a `room_left` envelope.
    pub fn room_left(room_id: impl Into<String>) -> Self {
        Self::RoomLeft {
            room_id: room_id.into(),
        }
    }

    /// Build a `room_not_found` envelope.
    pub fn room_not_found(room_id: impl Into<String>) -> Self {
        Self::RoomNotFound {
            room_id: room_id.into(),
        }
    }

    /// Build a chat envelope.
    pub fn chat(room_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Message {
            room_id: room_id.into(),
            payload,
        }
    }

    /// The envelope's kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::JoinRoom { .. } => MessageKind::JoinRoom,
            Self::LeaveRoom { .. } => MessageKind::LeaveRoom,
            Self::RoomJoined { .. } => MessageKind::RoomJoined,
            Self::RoomLeft { .. } => MessageKind::RoomLeft,
            Self::RoomNotFound { .. } => MessageKind::RoomNotFound,
            Self::Message { .. } => MessageKind::Message,
        }
    }

    /// The room identity every envelope is addressed to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id }
            | Self::LeaveRoom { room_id }
            | Self::RoomJoined { room_id }
            | Self::RoomLeft { room_id }
            | Self::RoomNotFound { room_id }
            | Self::Message { room_id, .. } => room_id,
        }
    }

    /// Serialize the envelope to its JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decode an envelope from raw frame bytes (text or binary frames).
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
        text.parse()
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(ProtocolError::Malformed)
    }
}
