//! Test WebSocket client.
//!
//! Speaks the JSON envelope protocol and asserts on received envelopes.

use futures_util::{SinkExt, StreamExt};
use slroom_proto::Message;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A test room client.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Upgrade with `?sessionId=<session_id>` and a `clientId: <room_id>` header.
    pub async fn connect(address: &str, session_id: &str, room_id: &str) -> anyhow::Result<Self> {
        let mut request = format!("ws://{address}/ws?sessionId={session_id}").into_client_request()?;
        request.headers_mut().insert(
            HeaderName::from_bytes(b"clientId")?,
            HeaderValue::from_str(room_id)?,
        );
        let (stream, _response) = connect_async(request).await?;
        Ok(Self { stream })
    }

    /// Send an envelope.
    pub async fn send(&mut self, message: Message) -> anyhow::Result<()> {
        self.stream.send(WsMessage::Text(message.encode()?)).await?;
        Ok(())
    }

    /// Send raw text, bypassing the encoder.
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, text: &str) -> anyhow::Result<()> {
        self.stream.send(WsMessage::Text(text.to_string())).await?;
        Ok(())
    }

    /// Receive a single envelope from the server.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive an envelope with a timeout, skipping keep-alive frames.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        loop {
            let frame = timeout(dur, self.stream.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            match frame {
                WsMessage::Text(text) => return Ok(text.parse()?),
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                WsMessage::Close(frame) => anyhow::bail!("connection closed: {frame:?}"),
                other => anyhow::bail!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Assert that nothing but keep-alive frames arrive for `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(message) => anyhow::bail!("unexpected envelope: {message:?}"),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait until the server closes the connection.
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            match timeout(Duration::from_secs(5), self.stream.next()).await? {
                None | Some(Ok(WsMessage::Close(_))) | Some(Err(_)) => return Ok(()),
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Close the connection from the client side.
    pub async fn quit(mut self) -> anyhow::Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
