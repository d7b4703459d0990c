//! Process references.

use super::{ActorPath, Envelope};
use crate::error::ActorError;
use std::fmt;
use std::hash::{Hash, Hasher};
use tokio::sync::{mpsc, oneshot};

/// Address of a running actor.
///
/// Immutable: a path for identification plus the sending half of the actor's
/// mailbox. It can only enqueue messages, never touch the actor's state.
/// Equality and hashing use the path.
pub struct Pid<M> {
    path: ActorPath,
    mailbox: mpsc::UnboundedSender<Envelope<M>>,
}

impl<M> Clone for Pid<M> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<M> Pid<M> {
    pub(crate) fn new(path: ActorPath, mailbox: mpsc::UnboundedSender<Envelope<M>>) -> Self {
        Self { path, mailbox }
    }

    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Whether the actor is still accepting messages.
    pub fn is_alive(&self) -> bool {
        !self.mailbox.is_closed()
    }

    pub(crate) fn same_mailbox(&self, other: &Pid<M>) -> bool {
        self.mailbox.same_channel(&other.mailbox)
    }
}

impl<M: Send + 'static> Pid<M> {
    /// Enqueue `message`, naming `sender` as the reply target.
    ///
    /// Never waits: the mailbox is unbounded, so the only failure is a
    /// mailbox that has already been closed by a stopping actor.
    pub fn tell(&self, sender: Option<&Pid<M>>, message: M) -> Result<(), ActorError> {
        self.deliver(sender.cloned(), message)
    }

    pub(crate) fn deliver(&self, sender: Option<Pid<M>>, message: M) -> Result<(), ActorError> {
        self.mailbox
            .send(Envelope::Mail { sender, message })
            .map_err(|_| ActorError::MailboxClosed(self.path.clone()))
    }

    /// Stop the actor and wait until its post-stop hook has finished.
    pub async fn stop(&self) -> Result<(), ActorError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.mailbox
            .send(Envelope::Stop { done: done_tx })
            .map_err(|_| ActorError::MailboxClosed(self.path.clone()))?;
        done_rx
            .await
            .map_err(|_| ActorError::MailboxClosed(self.path.clone()))
    }
}

impl<M> PartialEq for Pid<M> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<M> Eq for Pid<M> {}

impl<M> Hash for Pid<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl<M> fmt::Debug for Pid<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pid").field(&self.path.as_str()).finish()
    }
}
