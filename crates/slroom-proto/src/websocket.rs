//! WebSocket handshake validation.
//!
//! A room connection is established by an HTTP upgrade that names the
//! session in a query parameter and the room in a request header:
//!
//! ```text
//! GET /ws?sessionId=s1 HTTP/1.1
//! clientId: lobby
//! Upgrade: websocket
//! ```
//!
//! Both values are opaque and used verbatim.

use std::fmt;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// Configuration for room connection upgrades.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Request path accepted for upgrades (e.g. `/ws`).
    pub path: String,
    /// Query parameter carrying the session id.
    pub session_param: String,
    /// Request header carrying the room selector.
    pub room_header: String,
    /// List of allowed origin URLs (empty allows all).
    pub allowed_origins: Vec<String>,
    /// Whether an Origin header is required.
    pub require_origin: bool,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            path: "/ws".to_string(),
            session_param: "sessionId".to_string(),
            room_header: "clientId".to_string(),
            allowed_origins: Vec::new(),
            require_origin: false,
        }
    }
}

/// Values extracted from an accepted upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Session id, used verbatim as the session proxy name.
    pub session_id: String,
    /// Room selector, used verbatim as the room identity.
    pub room_id: String,
}

/// Result of WebSocket handshake validation.
#[derive(Debug)]
#[non_exhaustive]
pub enum HandshakeResult {
    /// Handshake accepted.
    Accept {
        /// Connection parameters.
        params: ConnectParams,
        /// The client's origin, if provided.
        origin: Option<String>,
    },
    /// Handshake rejected with error details.
    Reject {
        /// HTTP status code to return.
        status: u16,
        /// Human-readable rejection reason.
        reason: String,
    },
}

impl HandshakeResult {
    fn reject(status: u16, reason: impl Into<String>) -> Self {
        Self::Reject {
            status,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HandshakeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeResult::Accept { params, origin } => {
                write!(f, "Accept (session: {}, room: {})", params.session_id, params.room_id)?;
                if let Some(orig) = origin {
                    write!(f, " (origin: {})", orig)?;
                }
                Ok(())
            }
            HandshakeResult::Reject { status, reason } => {
                write!(f, "Reject {} - {}", status, reason)
            }
        }
    }
}

/// Find a query parameter by name. Values are not percent-decoded.
fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Validate an upgrade request against the configuration.
///
/// Checks, in order: request path, origin policy, session id, room selector.
pub fn validate_handshake(req: &Request, config: &HandshakeConfig) -> HandshakeResult {
    if req.uri().path() != config.path {
        return HandshakeResult::reject(404, format!("unknown path '{}'", req.uri().path()));
    }

    let origin = req
        .headers()
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if config.require_origin && origin.is_none() {
        return HandshakeResult::reject(403, "Origin header required");
    }

    if !config.allowed_origins.is_empty() {
        if let Some(ref origin_value) = origin {
            if !config
                .allowed_origins
                .iter()
                .any(|allowed| allowed == origin_value || allowed == "*")
            {
                return HandshakeResult::reject(403, format!("Origin '{}' not allowed", origin_value));
            }
        }
    }

    let session_id = match query_param(req.uri().query(), &config.session_param) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return HandshakeResult::reject(
                400,
                format!("missing '{}' query parameter", config.session_param),
            );
        }
    };

    let room_id = match req
        .headers()
        .get(config.room_header.as_str())
        .and_then(|v| v.to_str().ok())
    {
        Some(room) if !room.is_empty() => room.to_string(),
        _ => {
            return HandshakeResult::reject(400, format!("missing '{}' header", config.room_header));
        }
    };

    HandshakeResult::Accept {
        params: ConnectParams { session_id, room_id },
        origin,
    }
}

/// Build the HTTP error response for a rejected upgrade.
pub fn reject_response(status: u16, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
    response
}
