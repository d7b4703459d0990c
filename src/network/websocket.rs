//! WebSocket implementation of the frame transport.
//!
//! Keep-alive follows the usual WebSocket server pattern:
//! - a ping is written every `pong_wait * 9 / 10`
//! - every inbound frame (pongs included) refreshes the `pong_wait` read deadline
//! - every outbound frame is bounded by `write_wait`

use super::transport::{FrameSink, FrameSource};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use slroom_proto::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, trace};

/// Keep-alive timing for one connection.
#[derive(Debug, Clone, Copy)]
pub struct KeepAlive {
    /// Maximum silence from the peer before the read deadline expires.
    pub pong_wait: Duration,
    /// Deadline for a single outbound frame.
    pub write_wait: Duration,
}

impl KeepAlive {
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 9 / 10
    }
}

type SharedSink<S> = Arc<Mutex<SplitSink<WebSocketStream<S>, WsMessage>>>;

/// Split an upgraded stream into session-owned halves and start pinging.
pub fn split<S>(stream: WebSocketStream<S>, keepalive: KeepAlive) -> (WsSink<S>, WsSource<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, source) = stream.split();
    let sink: SharedSink<S> = Arc::new(Mutex::new(sink));
    let pinger = tokio::spawn(ping_loop(Arc::clone(&sink), keepalive));

    (
        WsSink {
            inner: sink,
            write_wait: keepalive.write_wait,
            pinger,
            closed: false,
        },
        WsSource {
            inner: source,
            pong_wait: keepalive.pong_wait,
        },
    )
}

async fn ping_loop<S>(sink: SharedSink<S>, keepalive: KeepAlive)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut ticker = tokio::time::interval(keepalive.ping_period());
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let mut sink = sink.lock().await;
        match timeout(keepalive.write_wait, sink.send(WsMessage::Ping(Vec::new()))).await {
            Ok(Ok(())) => trace!("Ping sent"),
            Ok(Err(e)) => {
                debug!(error = %e, "Ping failed, keep-alive stopped");
                return;
            }
            Err(_) => {
                debug!("Ping write deadline exceeded, keep-alive stopped");
                return;
            }
        }
    }
}

/// Outbound half: JSON text frames plus the keep-alive pinger.
pub struct WsSink<S> {
    inner: SharedSink<S>,
    write_wait: Duration,
    pinger: JoinHandle<()>,
    closed: bool,
}

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let text = message
            .encode()
            .map_err(|e| TransportError::Write(e.to_string()))?;

        let mut sink = self.inner.lock().await;
        match timeout(self.write_wait, sink.send(WsMessage::Text(text))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Write(e.to_string())),
            Err(_) => Err(TransportError::Timeout(self.write_wait)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pinger.abort();

        let mut sink = self.inner.lock().await;
        match timeout(self.write_wait, sink.close()).await {
            Ok(Ok(())) | Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Write(e.to_string())),
            Err(_) => Err(TransportError::Timeout(self.write_wait)),
        }
    }
}

impl<S> Drop for WsSink<S> {
    fn drop(&mut self) {
        self.pinger.abort();
    }
}

/// Inbound half: decodes text and binary frames, enforces the read deadline.
pub struct WsSource<S> {
    inner: SplitStream<WebSocketStream<S>>,
    pong_wait: Duration,
}

#[async_trait]
impl<S> FrameSource for WsSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            let next = timeout(self.pong_wait, self.inner.next())
                .await
                .map_err(|_| TransportError::Timeout(self.pong_wait))?;

            match next {
                None
                | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed))
                | Some(Ok(WsMessage::Close(_))) => return Ok(None),
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.parse()?)),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(Some(Message::decode_bytes(&bytes)?)),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    trace!("Keep-alive frame received");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::Role;

    async fn pair(keepalive: KeepAlive) -> (WsSink<tokio::io::DuplexStream>, WsSource<tokio::io::DuplexStream>, WebSocketStream<tokio::io::DuplexStream>) {
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let (sink, source) = split(server, keepalive);
        (sink, source, client)
    }

    fn slow_keepalive() -> KeepAlive {
        KeepAlive {
            pong_wait: Duration::from_secs(30),
            write_wait: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn decodes_text_and_binary_frames() {
        let (_sink, mut source, mut client) = pair(slow_keepalive()).await;

        client
            .send(WsMessage::Text(r#"{"type":"join_room","room_id":"lobby"}"#.into()))
            .await
            .unwrap();
        client
            .send(WsMessage::Binary(br#"{"type":"leave_room","room_id":"lobby"}"#.to_vec()))
            .await
            .unwrap();

        assert_eq!(source.recv().await.unwrap(), Some(Message::join_room("lobby")));
        assert_eq!(source.recv().await.unwrap(), Some(Message::leave_room("lobby")));
    }

    #[tokio::test]
    async fn malformed_frame_is_a_decode_error() {
        let (_sink, mut source, mut client) = pair(slow_keepalive()).await;
        client.send(WsMessage::Text("{oops".into())).await.unwrap();
        assert!(matches!(source.recv().await, Err(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn peer_close_ends_the_stream() {
        let (_sink, mut source, mut client) = pair(slow_keepalive()).await;
        client.close(None).await.unwrap();
        assert_eq!(source.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn silent_peer_hits_the_read_deadline() {
        let keepalive = KeepAlive {
            pong_wait: Duration::from_millis(150),
            write_wait: Duration::from_secs(1),
        };
        let (_sink, mut source, _client) = pair(keepalive).await;
        assert!(matches!(source.recv().await, Err(TransportError::Timeout(_))));
    }

    #[tokio::test]
    async fn pings_are_sent_periodically() {
        let keepalive = KeepAlive {
            pong_wait: Duration::from_millis(100),
            write_wait: Duration::from_secs(1),
        };
        let (_sink, _source, mut client) = pair(keepalive).await;

        let frame = timeout(Duration::from_secs(2), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(frame, WsMessage::Ping(_)));
    }

    #[tokio::test]
    async fn sends_json_and_closes_once() {
        let (mut sink, _source, mut client) = pair(slow_keepalive()).await;

        sink.send(&Message::room_joined("lobby")).await.unwrap();
        let frame = client.next().await.unwrap().unwrap();
        assert_eq!(
            frame,
            WsMessage::Text(r#"{"type":"room_joined","room_id":"lobby"}"#.into())
        );

        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(matches!(sink.send(&Message::room_left("lobby")).await, Err(TransportError::Closed)));
        assert!(matches!(client.next().await, Some(Ok(WsMessage::Close(_)))));
    }
}
