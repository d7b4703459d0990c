//! Inbound read loop of a session.
//!
//! Decoded client envelopes become messages to the owning session; the
//! session itself never blocks on the connection.

use super::super::Event;
use crate::actor::Pid;
use crate::network::FrameSource;
use slroom_proto::Message;
use tracing::{debug, info, warn};

/// Read until the peer goes away or the transport fails, then stop the session.
pub(super) async fn run(mut source: Box<dyn FrameSource>, session: Pid<Event>) {
    loop {
        match source.recv().await {
            Ok(Some(
                message @ (Message::JoinRoom { .. }
                | Message::LeaveRoom { .. }
                | Message::Message { .. }),
            )) => {
                if session.tell(None, Event::Wire(message)).is_err() {
                    // Session already stopping; nothing left to feed.
                    return;
                }
            }
            Ok(Some(other)) => {
                debug!(kind = %other.kind(), "Ignoring server-only envelope from client");
            }
            Ok(None) => {
                info!("Connection closed by peer");
                break;
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Connection read failed");
                break;
            }
        }
    }

    if let Err(e) = session.stop().await {
        debug!(error = %e, "Session already stopped");
    }
}
