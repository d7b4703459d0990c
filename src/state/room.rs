//! Room registry actor.
//!
//! A `Room` is the single source of truth for the membership of one room
//! identity. It validates join requests against its own name, keeps members
//! keyed by their address, and answers straight to the requester (the
//! coordinator only relays).

use super::Event;
use crate::actor::{Actor, ActorPath, Context, Pid};
use crate::error::ActorError;
use async_trait::async_trait;
use slroom_proto::{Message, MessageKind};
use std::collections::HashMap;
use tracing::{debug, info};

pub struct Room {
    name: String,
    members: HashMap<ActorPath, Pid<Event>>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: HashMap::new(),
        }
    }

    fn handle_join(&mut self, ctx: &Context<'_, Event>, room_id: String) {
        if room_id != self.name {
            debug!(requested = %room_id, "Join addressed to another room");
            ctx.unhandled(MessageKind::JoinRoom.as_str());
            return;
        }
        let Some(sender) = ctx.sender().cloned() else {
            ctx.unhandled(MessageKind::JoinRoom.as_str());
            return;
        };

        // Re-adding a member overwrites the same key.
        if self
            .members
            .insert(sender.path().clone(), sender.clone())
            .is_none()
        {
            crate::metrics::set_room_members(&self.name, self.members.len());
            info!(member = %sender.path(), members = self.members.len(), "Member joined");
        }

        if let Err(e) = ctx.tell(&sender, Message::room_joined(room_id).into()) {
            debug!(member = %sender.path(), error = %e, "Join confirmation undeliverable");
        }
    }

    fn handle_leave(&mut self, ctx: &Context<'_, Event>, room_id: String) {
        let Some(sender) = ctx.sender().cloned() else {
            ctx.unhandled(MessageKind::LeaveRoom.as_str());
            return;
        };

        // Leaving a room one is not in gets no reply.
        if self.members.remove(sender.path()).is_none() {
            debug!(requester = %sender.path(), "Leave from non-member ignored");
            return;
        }
        crate::metrics::set_room_members(&self.name, self.members.len());
        info!(member = %sender.path(), members = self.members.len(), "Member left");

        if let Err(e) = ctx.tell(&sender, Message::room_left(room_id).into()) {
            debug!(member = %sender.path(), error = %e, "Leave confirmation undeliverable");
        }
    }

    /// Relay a chat envelope to every member except its author.
    fn handle_message(&self, ctx: &Context<'_, Event>, room_id: String, payload: serde_json::Value) {
        let author = match ctx.sender() {
            Some(sender) if room_id == self.name && self.members.contains_key(sender.path()) => {
                sender.path().clone()
            }
            _ => {
                ctx.unhandled(MessageKind::Message.as_str());
                return;
            }
        };

        let mut delivered = 0usize;
        for (path, member) in &self.members {
            if *path == author {
                continue;
            }
            match ctx.tell(member, Message::chat(room_id.clone(), payload.clone()).into()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(member = %path, error = %e, "Chat delivery failed"),
            }
        }
        crate::metrics::observe_fanout(delivered);
    }

    fn member_paths(&self) -> Vec<ActorPath> {
        let mut members: Vec<ActorPath> = self.members.keys().cloned().collect();
        members.sort();
        members
    }
}

#[async_trait]
impl Actor<Event> for Room {
    async fn receive(&mut self, ctx: &mut Context<'_, Event>, event: Event) {
        match event {
            Event::Wire(Message::JoinRoom { room_id }) => self.handle_join(ctx, room_id),
            Event::Wire(Message::LeaveRoom { room_id }) => self.handle_leave(ctx, room_id),
            Event::Wire(Message::Message { room_id, payload }) => {
                self.handle_message(ctx, room_id, payload)
            }
            Event::GetMembers { reply_tx } => {
                let _ = reply_tx.send(self.member_paths());
            }
            other => ctx.unhandled(other.kind()),
        }
    }

    async fn post_stop(&mut self) -> Result<(), ActorError> {
        crate::metrics::remove_room_metrics(&self.name);
        Ok(())
    }
}
