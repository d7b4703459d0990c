//! Membership state.
//!
//! Contains the coordinator, room registries and session proxies, all of
//! which are actors exchanging [`Event`]s.

mod coordinator;
mod event;
mod room;
mod session;

pub use coordinator::{COORDINATOR_NAME, Coordinator, room_path, session_path, sessions_root};
pub use event::{ConnectRequest, Directory, Event};
pub use room::Room;
pub use session::SessionProxy;
