//! Session service: per-connection state machine and event dispatch.
//!
//! ARCHITECTURE
//! ============
//! ```text
//! Unbound --join-room--> Bound(R) --join-room(R')--> Bound(R')
//!    |                      |
//!    +-----disconnect-------+-----> Disconnected (terminal)
//! ```
//!
//! DESIGN
//! ======
//! Every outbound event, including the ones meant only for this connection,
//! goes through the room's client channels while the room lock is held. A
//! joining client therefore sees its snapshot before any later broadcast, and
//! a committer sees its own stroke in the same position as everyone else.
//!
//! While `Unbound`, events act on the default room without making this
//! connection a member: strokes and undo/redo land there, but nothing is
//! echoed back, and cursor moves do nothing because there is no cursor entry.
//!
//! Switching rooms fully leaves the old room (user, cursor, channel) and
//! tells its remaining members before registering in the new one.

use serde_json::Value;
use tokio::sync::{OwnedMutexGuard, mpsc};
use tracing::{debug, info};

use crate::event::{ClientEvent, ServerEvent, now_ms};
use crate::services::broadcast::{self, broadcast};
use crate::services::registry::{RoomRegistry, SharedRoom, resolve_room_id};
use crate::services::room::Room;
use crate::services::stroke::{commit_stroke, preview_stroke};
use crate::state::{ClientId, Cursor, DEFAULT_ROOM, LiveRoom, RoomId, StrokeInput};

// =============================================================================
// TYPES
// =============================================================================

/// Where a connection currently sends its events.
pub enum SessionState {
    Unbound,
    Bound { room_id: RoomId, room: SharedRoom },
    Disconnected,
}

pub struct Session {
    client_id: ClientId,
    tx: mpsc::UnboundedSender<ServerEvent>,
    registry: RoomRegistry,
    state: SessionState,
}

impl Session {
    #[must_use]
    pub fn new(registry: RoomRegistry, client_id: ClientId, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { client_id, tx, registry, state: SessionState::Unbound }
    }

    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Room this connection is bound to, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Bound { room_id, .. } => Some(room_id.as_str()),
            SessionState::Unbound | SessionState::Disconnected => None,
        }
    }

    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        matches!(self.state, SessionState::Disconnected)
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl Session {
    /// Apply one inbound event. All emissions flow through room channels.
    pub async fn handle(&mut self, event: ClientEvent) {
        if self.is_disconnected() {
            debug!(client_id = %self.client_id, event = event.name(), "session: ignoring event after disconnect");
            return;
        }
        if event.is_high_frequency() {
            debug!(client_id = %self.client_id, room_id = ?self.room_id(), event = event.name(), "session: recv");
        } else {
            info!(client_id = %self.client_id, room_id = ?self.room_id(), event = event.name(), "session: recv");
        }

        match event {
            ClientEvent::JoinRoom { room_id } => self.join(resolve_room_id(room_id)).await,
            ClientEvent::CommitStroke(input) => self.commit(input).await,
            ClientEvent::PreviewStroke(input) => self.preview(input).await,
            ClientEvent::CursorMove { x, y } => self.move_cursor(x, y).await,
            ClientEvent::Undo => self.undo_redo(Room::undo).await,
            ClientEvent::Redo => self.undo_redo(Room::redo).await,
        }
    }

    /// Transport signalled the socket is gone. Terminal.
    pub async fn disconnect(&mut self) {
        let previous = std::mem::replace(&mut self.state, SessionState::Disconnected);
        if let SessionState::Bound { room_id, room } = previous {
            self.leave(&room_id, &room).await;
        }
        info!(client_id = %self.client_id, "session: disconnected");
    }

    /// Lock the room events currently apply to.
    async fn target(&self) -> Option<OwnedMutexGuard<LiveRoom>> {
        match &self.state {
            SessionState::Bound { room, .. } => Some(room.clone().lock_owned().await),
            SessionState::Unbound => Some(self.registry.acquire(DEFAULT_ROOM).await.1),
            SessionState::Disconnected => None,
        }
    }
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

impl Session {
    async fn join(&mut self, room_id: RoomId) {
        if let SessionState::Bound { room_id: current, room } = &self.state {
            if *current != room_id {
                let (current, room) = (current.clone(), room.clone());
                self.leave(&current, &room).await;
                self.state = SessionState::Unbound;
            }
        }

        let (shared, mut live) = self.registry.acquire(&room_id).await;
        live.attach(self.client_id, self.tx.clone());
        let user = live.room.add_user(self.client_id);
        live.room.place_cursor(self.client_id, Cursor::parked(&user));

        broadcast::send_to(&live, self.client_id, broadcast::canvas_state(&live));
        broadcast(&live, &broadcast::user_list(&live), Some(self.client_id));

        info!(
            client_id = %self.client_id,
            %room_id,
            name = %user.name,
            users = live.room.user_count(),
            "session: joined room"
        );
        drop(live);
        self.state = SessionState::Bound { room_id, room: shared };
    }

    async fn leave(&self, room_id: &str, room: &SharedRoom) {
        let mut live = room.lock().await;
        live.detach(self.client_id);
        let departed = live.room.remove_user(self.client_id);
        live.room.remove_cursor(self.client_id);

        broadcast(&live, &broadcast::user_list(&live), None);
        broadcast(&live, &broadcast::cursor_positions(&live), None);
        info!(
            client_id = %self.client_id,
            %room_id,
            name = departed.as_ref().map_or("", |u| u.name.as_str()),
            remaining = live.clients.len(),
            "session: left room"
        );
    }
}

// =============================================================================
// CANVAS EVENTS
// =============================================================================

impl Session {
    async fn commit(&self, input: StrokeInput) {
        let stroke = commit_stroke(input, self.client_id, now_ms());
        let Some(mut live) = self.target().await else {
            return;
        };
        info!(
            client_id = %self.client_id,
            room_id = live.room.id(),
            stroke_id = %stroke.id,
            points = stroke.point_count(),
            tool = ?stroke.body.get("tool"),
            "session: stroke committed"
        );
        live.room.add_stroke(stroke.clone());
        broadcast(&live, &ServerEvent::NewDraw(stroke), None);
    }

    async fn preview(&self, input: StrokeInput) {
        let stroke = preview_stroke(input, self.client_id, now_ms());
        let Some(live) = self.target().await else {
            return;
        };
        broadcast(&live, &ServerEvent::Drawing(stroke), Some(self.client_id));
    }

    async fn move_cursor(&self, x: Value, y: Value) {
        let Some(mut live) = self.target().await else {
            return;
        };
        if live.room.move_cursor(self.client_id, x, y) {
            broadcast(&live, &broadcast::cursor_positions(&live), None);
        }
    }

    async fn undo_redo(&self, op: fn(&mut Room) -> bool) {
        let Some(mut live) = self.target().await else {
            return;
        };
        let changed = op(&mut live.room);
        info!(
            client_id = %self.client_id,
            room_id = live.room.id(),
            changed,
            history = live.room.history().len(),
            redo = live.room.redo_stack().len(),
            "session: history updated"
        );
        broadcast(&live, &broadcast::canvas_update(&live), None);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
