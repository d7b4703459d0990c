//! Per-message receive context.

use super::{ActorSystem, Pid};
use crate::error::ActorError;
use std::sync::Arc;

/// Context handed to an actor for each message it processes.
pub struct Context<'a, M> {
    system: &'a Arc<ActorSystem<M>>,
    myself: &'a Pid<M>,
    sender: Option<Pid<M>>,
}

impl<'a, M: Send + 'static> Context<'a, M> {
    pub(crate) fn new(
        system: &'a Arc<ActorSystem<M>>,
        myself: &'a Pid<M>,
        sender: Option<Pid<M>>,
    ) -> Self {
        Self {
            system,
            myself,
            sender,
        }
    }

    /// The actor processing this message.
    pub fn myself(&self) -> &Pid<M> {
        self.myself
    }

    /// The reply target of this message, if the producer named one.
    pub fn sender(&self) -> Option<&Pid<M>> {
        self.sender.as_ref()
    }

    pub fn system(&self) -> &Arc<ActorSystem<M>> {
        self.system
    }

    /// Send `message` to `to` with this actor as the reply target.
    pub fn tell(&self, to: &Pid<M>, message: M) -> Result<(), ActorError> {
        to.deliver(Some(self.myself.clone()), message)
    }

    /// Relay `message` to `to`, keeping the original sender as the reply
    /// target so the answer bypasses this actor.
    pub fn forward(&self, to: &Pid<M>, message: M) -> Result<(), ActorError> {
        to.deliver(self.sender.clone(), message)
    }

    /// Mark the current message as unhandled (dead letter).
    pub fn unhandled(&self, kind: &str) {
        self.system.record_dead_letter(
            self.myself.path(),
            self.sender.as_ref().map(|s| s.path()),
            kind,
        );
    }
}
