//! Network listener configuration.

use super::defaults::{
    default_listen_address, default_max_message_size, default_pong_wait_secs, default_room_header,
    default_session_param, default_write_wait_secs, default_ws_path,
};
use crate::network::KeepAlive;
use serde::Deserialize;
use slroom_proto::HandshakeConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080"). `PORT` overrides the port.
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

/// WebSocket upgrade and connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Upgrade path (e.g., "/ws").
    #[serde(default = "default_ws_path")]
    pub path: String,
    /// Query parameter carrying the session id.
    #[serde(default = "default_session_param")]
    pub session_param: String,
    /// Header naming the initial room.
    #[serde(default = "default_room_header")]
    pub room_header: String,
    /// Allowed origins for CORS (e.g., `["https://example.com"]`).
    /// Empty list allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Reject upgrades that carry no `Origin` header.
    #[serde(default)]
    pub require_origin: bool,
    /// Largest accepted inbound message in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Seconds of peer silence before the connection is dropped.
    #[serde(default = "default_pong_wait_secs")]
    pub pong_wait_secs: u64,
    /// Seconds allowed for a single outbound frame.
    #[serde(default = "default_write_wait_secs")]
    pub write_wait_secs: u64,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            path: default_ws_path(),
            session_param: default_session_param(),
            room_header: default_room_header(),
            allow_origins: Vec::new(),
            require_origin: false,
            max_message_size: default_max_message_size(),
            pong_wait_secs: default_pong_wait_secs(),
            write_wait_secs: default_write_wait_secs(),
        }
    }
}

impl WebSocketConfig {
    pub fn keepalive(&self) -> KeepAlive {
        KeepAlive {
            pong_wait: Duration::from_secs(self.pong_wait_secs),
            write_wait: Duration::from_secs(self.write_wait_secs),
        }
    }

    pub fn handshake(&self) -> HandshakeConfig {
        HandshakeConfig {
            path: self.path.clone(),
            session_param: self.session_param.clone(),
            room_header: self.room_header.clone(),
            allowed_origins: self.allow_origins.clone(),
            require_origin: self.require_origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_config_deserialize() {
        let toml_str = r#"
            address = "127.0.0.1:9000"
        "#;
        let cfg: ListenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.address.port(), 9000);
    }

    #[test]
    fn websocket_config_deserialize_defaults() {
        let cfg: WebSocketConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.path, "/ws");
        assert!(cfg.allow_origins.is_empty());
        assert!(!cfg.require_origin);
        assert_eq!(cfg.max_message_size, 1 << 20);
    }

    #[test]
    fn websocket_config_with_origins() {
        let toml_str = r#"
            allow_origins = ["https://example.com", "https://another.com"]
            require_origin = true
        "#;
        let cfg: WebSocketConfig = toml::from_str(toml_str).unwrap();
        let handshake = cfg.handshake();
        assert_eq!(handshake.allowed_origins.len(), 2);
        assert!(handshake.require_origin);
    }

    #[test]
    fn keepalive_pings_before_the_read_deadline() {
        let cfg = WebSocketConfig {
            pong_wait_secs: 60,
            ..Default::default()
        };
        let keepalive = cfg.keepalive();
        assert_eq!(keepalive.ping_period(), Duration::from_secs(54));
        assert_eq!(keepalive.write_wait, Duration::from_secs(10));
    }
}
