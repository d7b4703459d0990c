//! Gateway - WebSocket listener that admits connections.
//!
//! The Gateway accepts TCP connections, validates the upgrade request
//! (path, origin, session id, room selector), and hands the upgraded
//! stream to the coordinator, which spawns the session proxy.

use super::websocket::{self, KeepAlive};
use crate::actor::Pid;
use crate::config::WebSocketConfig;
use crate::state::{ConnectRequest, Event};
use slroom_proto::websocket::reject_response;
use slroom_proto::{ConnectParams, HandshakeConfig, HandshakeResult, validate_handshake};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as WsProtocolConfig;
use tracing::{Instrument, debug, error, info, instrument, warn};
use uuid::Uuid;

/// The Gateway accepts incoming WebSocket connections.
pub struct Gateway {
    listener: TcpListener,
    settings: WebSocketConfig,
    coordinator: Pid<Event>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        settings: WebSocketConfig,
        coordinator: Pid<Event>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, path = %settings.path, "WebSocket listener bound");

        Ok(Self {
            listener,
            settings,
            coordinator,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections until the coordinator stops.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let handshake = Arc::new(self.settings.handshake());
        let keepalive = self.settings.keepalive();
        let protocol = protocol_config(self.settings.max_message_size);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if !self.coordinator.is_alive() {
                        anyhow::bail!("coordinator stopped, refusing new connections");
                    }
                    let conn_id = Uuid::new_v4().to_string();
                    let span = crate::telemetry::spans::connection(&conn_id, &addr.to_string());
                    debug!(%addr, %conn_id, "Connection accepted");

                    tokio::spawn(
                        admit(
                            stream,
                            Arc::clone(&handshake),
                            protocol,
                            keepalive,
                            self.coordinator.clone(),
                        )
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

fn protocol_config(max_message_size: usize) -> WsProtocolConfig {
    let mut config = WsProtocolConfig::default();
    config.max_message_size = Some(max_message_size);
    config.max_frame_size = Some(max_message_size);
    config
}

/// Metric label for a rejected upgrade.
fn reject_label(status: u16) -> &'static str {
    match status {
        404 => "path",
        403 => "origin",
        400 => "missing_identity",
        _ => "other",
    }
}

/// Upgrade one connection and register it with the coordinator.
async fn admit(
    stream: TcpStream,
    handshake: Arc<HandshakeConfig>,
    protocol: WsProtocolConfig,
    keepalive: KeepAlive,
    coordinator: Pid<Event>,
) {
    let mut accepted: Option<ConnectParams> = None;
    let callback = |req: &Request, response: Response| match validate_handshake(req, &handshake) {
        HandshakeResult::Accept { params, origin } => {
            debug!(session = %params.session_id, room = %params.room_id, origin = ?origin, "Upgrade accepted");
            accepted = Some(params);
            Ok(response)
        }
        HandshakeResult::Reject { status, reason } => {
            warn!(status, %reason, "Upgrade rejected");
            crate::metrics::record_rejected_handshake(reject_label(status));
            Err(reject_response(status, &reason))
        }
        _ => Err(reject_response(400, "unsupported upgrade")),
    };

    let ws_stream = match accept_hdr_async_with_config(stream, callback, Some(protocol)).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            debug!(error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let Some(params) = accepted else {
        return;
    };

    let (sink, source) = websocket::split(ws_stream, keepalive);
    let (reply_tx, reply_rx) = oneshot::channel();
    let request = ConnectRequest {
        session_id: params.session_id.clone(),
        room_id: params.room_id.clone(),
        sink: Box::new(sink),
        source: Box::new(source),
        reply_tx,
    };
    if let Err(e) = coordinator.tell(None, Event::Connect(Box::new(request))) {
        error!(error = %e, "Coordinator unavailable, dropping connection");
        return;
    }

    match reply_rx.await {
        Ok(Ok(session)) => {
            info!(session = %session.path(), room = %params.room_id, "Connection established");
        }
        Ok(Err(e)) => {
            warn!(session = %params.session_id, error = %e, code = e.error_code(), "Connection refused");
        }
        Err(_) => warn!(session = %params.session_id, "Coordinator dropped the connection request"),
    }
}
