//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "slroomd".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

// =============================================================================
// WebSocket Defaults
// =============================================================================

pub fn default_ws_path() -> String {
    "/ws".to_string()
}

pub fn default_session_param() -> String {
    "sessionId".to_string()
}

pub fn default_room_header() -> String {
    "clientId".to_string()
}

/// 1 MiB per message.
pub fn default_max_message_size() -> usize {
    1 << 20
}

pub fn default_pong_wait_secs() -> u64 {
    60
}

pub fn default_write_wait_secs() -> u64 {
    10
}
