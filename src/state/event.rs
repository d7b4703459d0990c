//! Messages exchanged between the coordinator, rooms and sessions.

use crate::actor::{ActorPath, Pid};
use crate::error::ActorError;
use crate::network::{FrameSink, FrameSource};
use serde::Serialize;
use slroom_proto::Message;
use std::fmt;
use tokio::sync::oneshot;

/// Events that can be sent to a membership actor.
pub enum Event {
    /// A protocol envelope (join/leave intents, confirmations, chat).
    Wire(Message),
    /// A freshly upgraded connection (coordinator only).
    Connect(Box<ConnectRequest>),
    /// A session proxy finished its cleanup (coordinator only). The last
    /// path segment is the session id.
    SessionStopped { path: ActorPath },
    /// Request the member addresses of a room.
    GetMembers {
        reply_tx: oneshot::Sender<Vec<ActorPath>>,
    },
    /// Request the confirmed-membership cache of a session.
    GetRooms {
        reply_tx: oneshot::Sender<Vec<String>>,
    },
    /// Request the coordinator's directories.
    GetDirectory {
        reply_tx: oneshot::Sender<Directory>,
    },
}

impl Event {
    /// Static label for logs and dead-letter metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Wire(message) => message.kind().as_str(),
            Self::Connect(_) => "connect",
            Self::SessionStopped { .. } => "session_stopped",
            Self::GetMembers { .. } => "get_members",
            Self::GetRooms { .. } => "get_rooms",
            Self::GetDirectory { .. } => "get_directory",
        }
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Self::Wire(message)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(message) => f.debug_tuple("Wire").field(message).finish(),
            Self::Connect(request) => f.debug_tuple("Connect").field(request).finish(),
            Self::SessionStopped { path } => f
                .debug_struct("SessionStopped")
                .field("path", path)
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Everything the coordinator needs to admit a connection.
pub struct ConnectRequest {
    pub session_id: String,
    pub room_id: String,
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
    /// Setup outcome; an error means the connection is not established.
    pub reply_tx: oneshot::Sender<Result<Pid<Event>, ActorError>>,
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("session_id", &self.session_id)
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the coordinator's directories, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directory {
    pub rooms: Vec<String>,
    pub sessions: Vec<String>,
}
