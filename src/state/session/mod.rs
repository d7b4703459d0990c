//! Session proxy actor.
//!
//! One proxy exists per live connection. It forwards the client's intents to
//! the coordinator, keeps a cache of the rooms that have *confirmed* its
//! membership, relays confirmations back to the client, and leaves every
//! cached room when it stops.
//!
//! The cache only changes on confirmations from rooms, never on requests, so
//! it converges on what the room registries hold.

mod pump;

use super::Event;
use crate::actor::{Actor, Context, Pid};
use crate::error::ActorError;
use crate::network::{FrameSink, FrameSource};
use async_trait::async_trait;
use slroom_proto::Message;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

pub struct SessionProxy {
    id: String,
    coordinator: Pid<Event>,
    pid: Option<Pid<Event>>,
    /// room_id -> room that confirmed our membership.
    rooms: HashMap<String, Pid<Event>>,
    sink: Box<dyn FrameSink>,
    source: Option<Box<dyn FrameSource>>,
    pump: Option<JoinHandle<()>>,
}

impl SessionProxy {
    pub fn new(
        id: impl Into<String>,
        coordinator: Pid<Event>,
        sink: Box<dyn FrameSink>,
        source: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            id: id.into(),
            coordinator,
            pid: None,
            rooms: HashMap::new(),
            sink,
            source: Some(source),
            pump: None,
        }
    }

    /// Join/leave intents for rooms not yet confirmed go to the coordinator.
    fn request_membership(&self, ctx: &Context<'_, Event>, message: Message) {
        if self.rooms.contains_key(message.room_id()) {
            debug!(room = %message.room_id(), kind = %message.kind(), "Room already confirmed, request not forwarded");
            ctx.unhandled(message.kind().as_str());
            return;
        }
        if let Err(e) = ctx.tell(&self.coordinator, Event::Wire(message)) {
            warn!(error = %e, "Coordinator unreachable");
        }
    }

    fn confirm_joined(&mut self, ctx: &Context<'_, Event>, room_id: &str) -> bool {
        let Some(room) = ctx.sender().cloned() else {
            ctx.unhandled(slroom_proto::MessageKind::RoomJoined.as_str());
            return false;
        };
        info!(room = %room_id, "Joined room");
        self.rooms.insert(room_id.to_string(), room);
        true
    }

    fn confirm_left(&mut self, ctx: &Context<'_, Event>, room_id: &str) -> bool {
        let Some(room) = ctx.sender() else {
            ctx.unhandled(slroom_proto::MessageKind::RoomLeft.as_str());
            return false;
        };
        // Drop the entry whose address is the confirming room's.
        let before = self.rooms.len();
        self.rooms.retain(|_, cached| cached.path() != room.path());
        if self.rooms.len() < before {
            info!(room = %room_id, "Left room");
        }
        true
    }

    fn handle_chat(&self, ctx: &Context<'_, Event>, room_id: String, payload: serde_json::Value) -> Option<Message> {
        let cached = self.rooms.get(&room_id);
        let from_room = match (ctx.sender(), cached) {
            (Some(sender), Some(room)) => sender.path() == room.path(),
            _ => false,
        };

        if from_room {
            return Some(Message::chat(room_id, payload));
        }
        match cached {
            Some(room) if ctx.sender().is_none() => {
                if let Err(e) = ctx.tell(room, Event::Wire(Message::chat(room_id, payload))) {
                    debug!(error = %e, "Chat undeliverable");
                }
            }
            _ => ctx.unhandled(slroom_proto::MessageKind::Message.as_str()),
        }
        None
    }

    /// Write one envelope to the client; write failures are logged and dropped.
    async fn write(&mut self, message: Message) {
        if let Err(e) = self.sink.send(&message).await {
            debug!(kind = %message.kind(), error = %e, code = e.error_code(), "Failed to write to client");
        }
    }

    fn room_ids(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.rooms.keys().cloned().collect();
        rooms.sort();
        rooms
    }
}

#[async_trait]
impl Actor<Event> for SessionProxy {
    async fn post_start(&mut self, ctx: &mut Context<'_, Event>) {
        let pid = ctx.myself().clone();
        info!(session = %self.id, "Session started");

        if let Some(source) = self.source.take() {
            let span = info_span!("pump", session = %self.id);
            self.pump = Some(tokio::spawn(pump::run(source, pid.clone()).instrument(span)));
        }
        self.pid = Some(pid);
    }

    async fn receive(&mut self, ctx: &mut Context<'_, Event>, event: Event) {
        match event {
            Event::Wire(message @ (Message::JoinRoom { .. } | Message::LeaveRoom { .. })) => {
                self.request_membership(ctx, message)
            }
            Event::Wire(Message::RoomJoined { room_id }) => {
                if self.confirm_joined(ctx, &room_id) {
                    self.write(Message::room_joined(room_id)).await;
                }
            }
            Event::Wire(Message::RoomLeft { room_id }) => {
                if self.confirm_left(ctx, &room_id) {
                    self.write(Message::room_left(room_id)).await;
                }
            }
            Event::Wire(Message::RoomNotFound { room_id }) => {
                debug!(room = %room_id, "Room not found");
                self.write(Message::room_not_found(room_id)).await;
            }
            Event::Wire(Message::Message { room_id, payload }) => {
                if let Some(outbound) = self.handle_chat(ctx, room_id, payload) {
                    self.write(outbound).await;
                }
            }
            Event::GetRooms { reply_tx } => {
                let _ = reply_tx.send(self.room_ids());
            }
            other => ctx.unhandled(other.kind()),
        }
    }

    /// Leave every cached room and close the connection once.
    async fn post_stop(&mut self) -> Result<(), ActorError> {
        let mut failures = Vec::new();

        // Plain enqueues: none of them waits on the connection being torn down.
        for (room_id, room) in self.rooms.drain() {
            if let Err(e) = room.tell(self.pid.as_ref(), Event::Wire(Message::leave_room(room_id.clone()))) {
                warn!(room = %room_id, error = %e, "Leave on shutdown failed");
                failures.push(e);
            }
        }

        if let Err(e) = self.sink.close().await {
            failures.push(e.into());
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }

        info!(session = %self.id, "Session closed");

        if failures.is_empty() {
            Ok(())
        } else {
            crate::metrics::record_cleanup_failures(failures.len());
            Err(ActorError::Cleanup(failures))
        }
    }

    /// The id is free again; let the coordinator drop its directory entry.
    async fn post_release(&mut self) {
        if let Some(pid) = &self.pid {
            let stopped = Event::SessionStopped {
                path: pid.path().clone(),
            };
            if let Err(e) = self.coordinator.tell(None, stopped) {
                debug!(error = %e, "Coordinator gone before session stop");
            }
        }
    }
}
