//! Framed transport seam between connections and session proxies.
//!
//! A connection is split into a [`FrameSource`] (owned by the session's pump
//! task) and a [`FrameSink`] (owned by the session actor itself).

use crate::error::TransportError;
use async_trait::async_trait;
use slroom_proto::Message;

/// Outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Write one envelope, bounded by the transport's write deadline.
    async fn send(&mut self, message: &Message) -> Result<(), TransportError>;

    /// Close the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound half of a connection.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Block until the next envelope. `Ok(None)` means the peer closed cleanly.
    async fn recv(&mut self) -> Result<Option<Message>, TransportError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport doubles.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// Records written frames and close calls.
    #[derive(Clone, Default)]
    pub(crate) struct MemorySink {
        pub(crate) sent: Arc<Mutex<Vec<Message>>>,
        pub(crate) closes: Arc<AtomicUsize>,
    }

    impl MemorySink {
        pub(crate) fn sent(&self) -> Vec<Message> {
            self.sent.lock().unwrap().clone()
        }

        pub(crate) fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FrameSink for MemorySink {
        async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
            if self.close_count() > 0 {
                return Err(TransportError::Closed);
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Frames pushed by the test through the paired sender.
    pub(crate) struct ChannelSource {
        rx: mpsc::UnboundedReceiver<Result<Message, TransportError>>,
    }

    pub(crate) type SourceHandle = mpsc::UnboundedSender<Result<Message, TransportError>>;

    pub(crate) fn channel_source() -> (SourceHandle, ChannelSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ChannelSource { rx })
    }

    #[async_trait]
    impl FrameSource for ChannelSource {
        async fn recv(&mut self) -> Result<Option<Message>, TransportError> {
            match self.rx.recv().await {
                Some(Ok(message)) => Ok(Some(message)),
                Some(Err(e)) => Err(e),
                None => Ok(None),
            }
        }
    }
}
