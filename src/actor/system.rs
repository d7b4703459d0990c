//! Actor registry and spawner.

use super::{Actor, ActorPath, Context, Envelope, Pid};
use crate::error::ActorError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, warn};

/// Owns the name registry of every live actor exchanging messages of type `M`.
pub struct ActorSystem<M> {
    name: String,
    actors: DashMap<ActorPath, Pid<M>>,
    dead_letters: AtomicU64,
}

impl<M: Send + 'static> ActorSystem<M> {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            actors: DashMap::new(),
            dead_letters: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn a top-level actor.
    pub async fn spawn<A: Actor<M>>(self: &Arc<Self>, name: &str, actor: A) -> Result<Pid<M>, ActorError> {
        self.spawn_at(ActorPath::root(name)?, actor).await
    }

    /// Spawn an actor under `parent`.
    ///
    /// Fails with [`ActorError::AlreadyExists`] if the name is taken.
    pub async fn spawn_child<A: Actor<M>>(
        self: &Arc<Self>,
        parent: &ActorPath,
        name: &str,
        actor: A,
    ) -> Result<Pid<M>, ActorError> {
        self.spawn_at(parent.child(name)?, actor).await
    }

    async fn spawn_at<A: Actor<M>>(self: &Arc<Self>, path: ActorPath, mut actor: A) -> Result<Pid<M>, ActorError> {
        if self.actors.contains_key(&path) {
            return Err(ActorError::AlreadyExists(path));
        }

        actor.pre_start().await.map_err(|e| ActorError::StartFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let pid = Pid::new(path.clone(), tx);
        match self.actors.entry(path.clone()) {
            Entry::Occupied(_) => return Err(ActorError::AlreadyExists(path)),
            Entry::Vacant(slot) => {
                slot.insert(pid.clone());
            }
        }

        tokio::spawn(run(Arc::clone(self), pid.clone(), actor, rx));
        Ok(pid)
    }

    pub fn lookup(&self, path: &ActorPath) -> Option<Pid<M>> {
        self.actors.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Number of messages marked unhandled since start.
    pub fn dead_letters(&self) -> u64 {
        self.dead_letters.load(Ordering::Relaxed)
    }

    pub(crate) fn record_dead_letter(&self, actor: &ActorPath, sender: Option<&ActorPath>, kind: &str) {
        self.dead_letters.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_dead_letter(kind);
        debug!(%actor, sender = ?sender.map(ActorPath::as_str), kind, "Unhandled message");
    }

    /// Stop every actor, deepest paths first, waiting for each post-stop hook.
    pub async fn shutdown(&self) {
        self.stop_matching(|_| true).await;
    }

    /// Stop `root` and everything below it, deepest paths first.
    pub async fn stop_subtree(&self, root: &ActorPath) {
        self.stop_matching(|path| path.is_within(root)).await;
    }

    async fn stop_matching(&self, filter: impl Fn(&ActorPath) -> bool) {
        let mut pids: Vec<Pid<M>> = self
            .actors
            .iter()
            .filter(|e| filter(e.key()))
            .map(|e| e.value().clone())
            .collect();
        pids.sort_by_key(|pid| Reverse(pid.path().depth()));

        for pid in pids {
            if let Err(e) = pid.stop().await {
                debug!(actor = %pid.path(), error = %e, "Actor already stopped");
            }
        }
    }
}

/// The actor loop: startup signal, then one message at a time until stopped.
async fn run<M, A>(
    system: Arc<ActorSystem<M>>,
    pid: Pid<M>,
    mut actor: A,
    mut mailbox: mpsc::UnboundedReceiver<Envelope<M>>,
) where
    M: Send + 'static,
    A: Actor<M>,
{
    let span = crate::telemetry::spans::actor(pid.path().as_str());
    async move {
        actor.post_start(&mut Context::new(&system, &pid, None)).await;

        let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();
        while let Some(envelope) = mailbox.recv().await {
            match envelope {
                Envelope::Mail { sender, message } => {
                    let mut ctx = Context::new(&system, &pid, sender);
                    actor.receive(&mut ctx, message).await;
                }
                Envelope::Stop { done } => {
                    waiters.push(done);
                    break;
                }
            }
        }

        // Refuse new mail; anything already queued is dropped.
        mailbox.close();
        while let Ok(envelope) = mailbox.try_recv() {
            if let Envelope::Stop { done } = envelope {
                waiters.push(done);
            }
        }

        if let Err(e) = actor.post_stop().await {
            warn!(error = %e, code = e.error_code(), "Post-stop cleanup reported errors");
        }

        system
            .actors
            .remove_if(pid.path(), |_, registered| registered.same_mailbox(&pid));
        debug!("Actor stopped");
        actor.post_release().await;

        for done in waiters {
            let _ = done.send(());
        }
    }
    .instrument(span)
    .await
}
