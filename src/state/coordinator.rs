//! Coordinator actor: directory owner and request router.
//!
//! The coordinator owns two directories: room id → room registry and
//! session id → session proxy. It never holds membership itself. Join and
//! leave intents are forwarded to the room with the session kept as the
//! reply target, so confirmations travel room → session directly.
//!
//! Actor layout:
//!
//! ```text
//! /coordinator
//! /coordinator/rooms/<room_id>
//! /coordinator/sessions/<session_id>
//! ```

use super::{ConnectRequest, Directory, Event, Room, SessionProxy};
use crate::actor::{Actor, ActorPath, ActorSystem, Context, Pid};
use crate::error::ActorError;
use async_trait::async_trait;
use slroom_proto::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registered name of the coordinator.
pub const COORDINATOR_NAME: &str = "coordinator";

const ROOMS: &str = "rooms";
const SESSIONS: &str = "sessions";

/// Address of the registry for `room_id` under `coordinator`.
pub fn room_path(coordinator: &ActorPath, room_id: &str) -> Result<ActorPath, ActorError> {
    coordinator.child(ROOMS)?.child(room_id)
}

/// Address of the proxy for `session_id` under `coordinator`.
/// Parent of every session proxy.
pub fn sessions_root(coordinator: &ActorPath) -> Result<ActorPath, ActorError> {
    coordinator.child(SESSIONS)
}

pub fn session_path(coordinator: &ActorPath, session_id: &str) -> Result<ActorPath, ActorError> {
    coordinator.child(SESSIONS)?.child(session_id)
}

pub struct Coordinator {
    pid: Option<Pid<Event>>,
    rooms: HashMap<String, Pid<Event>>,
    sessions: HashMap<String, Pid<Event>>,
    preload: Vec<String>,
}

impl Coordinator {
    /// `preload` names rooms that exist from startup.
    pub fn new(preload: Vec<String>) -> Self {
        Self {
            pid: None,
            rooms: HashMap::new(),
            sessions: HashMap::new(),
            preload,
        }
    }

    /// Look up a room, spawning its registry on first use.
    async fn ensure_room(
        &mut self,
        system: &Arc<ActorSystem<Event>>,
        me: &ActorPath,
        room_id: &str,
    ) -> Result<Pid<Event>, ActorError> {
        if let Some(room) = self.rooms.get(room_id) {
            return Ok(room.clone());
        }

        let room = system
            .spawn_child(&me.child(ROOMS)?, room_id, Room::new(room_id))
            .await?;
        self.rooms.insert(room_id.to_string(), room.clone());
        crate::metrics::set_active_rooms(self.rooms.len());
        info!(room = %room_id, "Room created");
        Ok(room)
    }

    /// Forward a join/leave intent to its room, or answer `room_not_found`.
    fn route(&self, ctx: &Context<'_, Event>, message: Message) {
        if let Some(room) = self.rooms.get(message.room_id()) {
            if let Err(e) = ctx.forward(room, Event::Wire(message)) {
                warn!(error = %e, "Room unreachable");
            }
            return;
        }

        crate::metrics::record_routing_miss();
        debug!(room = %message.room_id(), kind = %message.kind(), "No such room");
        match ctx.sender() {
            Some(requester) => {
                let reply = Message::room_not_found(message.room_id());
                if let Err(e) = ctx.tell(requester, Event::Wire(reply)) {
                    debug!(error = %e, "Requester gone");
                }
            }
            None => ctx.unhandled(message.kind().as_str()),
        }
    }

    /// Admit a connection: spawn its proxy, make sure the room exists, then
    /// hand the proxy its initial join intent.
    async fn connect(
        &mut self,
        ctx: &Context<'_, Event>,
        session_id: &str,
        room_id: String,
        proxy: SessionProxy,
    ) -> Result<Pid<Event>, ActorError> {
        let me = self.pid.clone().ok_or(ActorError::CoordinatorUnavailable)?;
        let session = ctx
            .system()
            .spawn_child(&me.path().child(SESSIONS)?, session_id, proxy)
            .await?;
        self.sessions.insert(session_id.to_string(), session.clone());

        // The room must exist before the first join is routed.
        if let Err(e) = self.ensure_room(ctx.system(), me.path(), &room_id).await {
            self.sessions.remove(session_id);
            if let Err(stop_err) = session.stop().await {
                debug!(error = %stop_err, "Session already stopped");
            }
            return Err(e);
        }

        session.tell(None, Event::Wire(Message::join_room(room_id)))?;
        Ok(session)
    }

    fn session_stopped(&mut self, path: &ActorPath) {
        let session_id = path.name();
        // A newer session may have reused the id.
        if self
            .sessions
            .get(session_id)
            .is_some_and(|pid| pid.path() == path)
        {
            self.sessions.remove(session_id);
            debug!(session = %session_id, "Session removed from directory");
        }
    }

    fn directory(&self) -> Directory {
        let mut rooms: Vec<String> = self.rooms.keys().cloned().collect();
        let mut sessions: Vec<String> = self.sessions.keys().cloned().collect();
        rooms.sort();
        sessions.sort();
        Directory { rooms, sessions }
    }
}

#[async_trait]
impl Actor<Event> for Coordinator {
    async fn post_start(&mut self, ctx: &mut Context<'_, Event>) {
        let me = ctx.myself().clone();

        for room_id in std::mem::take(&mut self.preload) {
            if let Err(e) = self.ensure_room(ctx.system(), me.path(), &room_id).await {
                warn!(room = %room_id, error = %e, "Failed to preload room");
            }
        }
        info!(rooms = self.rooms.len(), "Coordinator started");
        self.pid = Some(me);
    }

    async fn receive(&mut self, ctx: &mut Context<'_, Event>, event: Event) {
        match event {
            Event::Wire(message @ (Message::JoinRoom { .. } | Message::LeaveRoom { .. })) => {
                self.route(ctx, message)
            }
            Event::Connect(request) => {
                let ConnectRequest {
                    session_id,
                    room_id,
                    sink,
                    source,
                    reply_tx,
                } = *request;
                let proxy = SessionProxy::new(session_id.clone(), ctx.myself().clone(), sink, source);
                let result = self.connect(ctx, &session_id, room_id, proxy).await;
                if let Err(e) = &result {
                    warn!(session = %session_id, error = %e, code = e.error_code(), "Connection setup failed");
                }
                crate::metrics::set_active_sessions(self.sessions.len());
                if reply_tx.send(result).is_err() {
                    debug!(session = %session_id, "Gateway stopped waiting for setup");
                }
            }
            Event::SessionStopped { path } => {
                self.session_stopped(&path);
                crate::metrics::set_active_sessions(self.sessions.len());
            }
            Event::GetDirectory { reply_tx } => {
                let _ = reply_tx.send(self.directory());
            }
            other => ctx.unhandled(other.kind()),
        }
    }
}
