//! Test probes: addressable mailboxes that tests read directly.

use super::{ActorPath, Envelope, Pid};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(100);

pub(crate) struct Probe<M> {
    rx: mpsc::UnboundedReceiver<Envelope<M>>,
}

/// A `Pid` backed by a mailbox no actor drains.
pub(crate) fn probe<M: Send + 'static>(name: &str) -> (Pid<M>, Probe<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let path = ActorPath::root(name).expect("valid probe name");
    (Pid::new(path, tx), Probe { rx })
}

impl<M> Probe<M> {
    /// Next message with its sender path. Panics after a timeout.
    pub(crate) async fn recv(&mut self) -> (Option<ActorPath>, M) {
        loop {
            match timeout(RECV_TIMEOUT, self.rx.recv()).await {
                Ok(Some(Envelope::Mail { sender, message })) => {
                    return (sender.map(|s| s.path().clone()), message);
                }
                Ok(Some(Envelope::Stop { .. })) => continue,
                Ok(None) => panic!("probe mailbox closed"),
                Err(_) => panic!("probe timed out waiting for a message"),
            }
        }
    }

    /// Assert nothing arrives for a short while.
    pub(crate) async fn expect_silence(&mut self) {
        if let Ok(Some(Envelope::Mail { .. })) = timeout(SILENCE, self.rx.recv()).await {
            panic!("probe received an unexpected message");
        }
    }

    /// Close the mailbox so further deliveries fail.
    pub(crate) fn close(&mut self) {
        self.rx.close();
    }
}
