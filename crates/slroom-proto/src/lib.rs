//! # slroom-proto
//!
//! Wire protocol for the Straylight room daemon.
//!
//! ## Features
//!
//! - Typed envelopes for room membership (`join_room`, `leave_room`,
//!   `room_joined`, `room_left`, `room_not_found`) and chat (`message`)
//! - A JSON text codec with a `type` tag and snake_case fields
//! - Optional WebSocket handshake validation (`tokio` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use slroom_proto::Message;
//!
//! let join = Message::join_room("lobby");
//! let text = join.encode().expect("serializable");
//! assert_eq!(text, r#"{"type":"join_room","room_id":"lobby"}"#);
//!
//! let parsed: Message = text.parse().expect("valid envelope");
//! assert_eq!(parsed, join);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
#[cfg(feature = "tokio")]
pub mod websocket;

pub use self::error::{ProtocolError, Result};
pub use self::message::{Message, MessageKind};
#[cfg(feature = "tokio")]
pub use self::websocket::{ConnectParams, HandshakeConfig, HandshakeResult, validate_handshake};
