//! Network module.
//!
//! Contains the Gateway (WebSocket listener) and the frame transport that
//! session proxies read from and write to.

mod gateway;
pub(crate) mod transport;
mod websocket;

pub use gateway::Gateway;
pub use transport::{FrameSink, FrameSource};
pub use websocket::KeepAlive;
