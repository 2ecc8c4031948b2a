//! Broadcast: fan-out of server events to the connections in a room.
//!
//! DESIGN
//! ======
//! Callers hold the room lock while fanning out, so every member sees events
//! in the order the room produced them. Sends never block: each connection
//! owns an unbounded outbound channel drained by its socket loop.

use tracing::debug;

use crate::event::ServerEvent;
use crate::state::{ClientId, LiveRoom};

/// Send an event to every client in the room, optionally excluding one.
/// Returns how many clients it was queued for.
pub fn broadcast(live: &LiveRoom, event: &ServerEvent, exclude: Option<ClientId>) -> usize {
    let mut delivered = 0;
    for (client_id, tx) in &live.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: a closed channel means the socket loop already ended.
        if tx.send(event.clone()).is_ok() {
            delivered += 1;
        } else {
            debug!(%client_id, room_id = live.room.id(), event = event.name(), "dropped event for closed client");
        }
    }
    delivered
}

/// Send an event to one client in the room. No-op if it is not attached.
pub fn send_to(live: &LiveRoom, client_id: ClientId, event: ServerEvent) -> bool {
    live.clients
        .get(&client_id)
        .is_some_and(|tx| tx.send(event).is_ok())
}

// =============================================================================
// EVENT BUILDERS
// =============================================================================

/// Full state for a joining client.
#[must_use]
pub fn canvas_state(live: &LiveRoom) -> ServerEvent {
    ServerEvent::CanvasState {
        history: live.room.history().to_vec(),
        redo_stack: live.room.redo_stack().to_vec(),
        users: live.room.list_users(),
    }
}

/// History and redo stack after undo/redo.
#[must_use]
pub fn canvas_update(live: &LiveRoom) -> ServerEvent {
    ServerEvent::CanvasUpdate { history: live.room.history().to_vec(), redo_stack: live.room.redo_stack().to_vec() }
}

#[must_use]
pub fn user_list(live: &LiveRoom) -> ServerEvent {
    ServerEvent::UserList { users: live.room.list_users() }
}

#[must_use]
pub fn cursor_positions(live: &LiveRoom) -> ServerEvent {
    ServerEvent::CursorPositions { cursors: live.room.cursors().clone() }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
