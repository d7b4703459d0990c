//! Minimal actor runtime.
//!
//! Every actor is a Tokio task that owns its state and drains an isolated
//! mailbox one message at a time, so state mutation inside an actor never
//! needs a lock.
//!
//! # Architecture
//!
//! - **Addressing**: a [`Pid`] is an immutable [`ActorPath`] plus the sending
//!   half of the mailbox. It is safe to copy into messages and map keys.
//! - **Delivery**: `tell` is fire-and-forget; `forward` relays a message while
//!   keeping the original sender as the reply target. Per sender/receiver
//!   pair, delivery is FIFO.
//! - **Lifecycle**: `pre_start` runs before the actor is registered (a failure
//!   aborts the spawn), `post_start` is the first thing the loop processes,
//!   and `post_stop` then `post_release` complete before [`Pid::stop`]
//!   returns.
//! - **Dead letters**: messages an actor declines are recorded through
//!   [`Context::unhandled`] (debug log, counter, metric).

mod context;
mod path;
mod pid;
mod system;
#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub use path::ActorPath;
pub use pid::Pid;
pub use system::ActorSystem;

use crate::error::ActorError;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Items in an actor's mailbox.
pub(crate) enum Envelope<M> {
    Mail { sender: Option<Pid<M>>, message: M },
    Stop { done: oneshot::Sender<()> },
}

/// Behaviour of an actor exchanging messages of type `M`.
#[async_trait]
pub trait Actor<M: Send + 'static>: Send + 'static {
    async fn pre_start(&mut self) -> Result<(), ActorError> {
        Ok(())
    }

    /// Startup signal: the actor is now addressable.
    async fn post_start(&mut self, _ctx: &mut Context<'_, M>) {}

    async fn receive(&mut self, ctx: &mut Context<'_, M>, message: M);

    /// Final cleanup; the mailbox is already closed when this runs.
    async fn post_stop(&mut self) -> Result<(), ActorError> {
        Ok(())
    }

    /// Runs after the path has been released, so a successor may already
    /// be registered under it.
    async fn post_release(&mut self) {}
}
