//! Room service: history, undo/redo, roster, and cursors for one canvas.
//!
//! DESIGN
//! ======
//! History and redo are two plain stacks. Committing pushes onto history and
//! empties redo; undo and redo move the top stroke between the stacks and are
//! no-ops on an empty source. There is one shared history per room, so undo
//! may take back another user's most recent stroke.
//!
//! Names (`User-N`) and colors come from per-room counters that only move
//! forward. Leaving never frees a name or a color.
//!
//! `Room` does no I/O and holds no channels. Callers lock it through
//! `LiveRoom` and fan out the results themselves.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::services::palette::Palette;
use crate::state::{ClientId, Cursor, RoomId, Stroke, User};

// =============================================================================
// TYPES
// =============================================================================

/// Read-only view returned by the diagnostic query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub history_length: usize,
    pub redo_length: usize,
    pub users: Vec<User>,
}

impl RoomSummary {
    /// Summary of a room that was never created.
    #[must_use]
    pub fn empty(room_id: impl Into<RoomId>) -> Self {
        Self { room_id: room_id.into(), history_length: 0, redo_length: 0, users: Vec::new() }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    history: Vec<Stroke>,
    redo_stack: Vec<Stroke>,
    /// Roster in join order.
    users: Vec<User>,
    cursors: HashMap<ClientId, Cursor>,
    palette: Palette,
    name_counter: u64,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            redo_stack: Vec::new(),
            users: Vec::new(),
            cursors: HashMap::new(),
            palette: Palette::new(),
            name_counter: 1,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// ROSTER
// =============================================================================

impl Room {
    /// Register a connection with the next name and color.
    ///
    /// A connection that is already listed keeps its roster position but
    /// gets the freshly allocated identity.
    pub fn add_user(&mut self, client_id: ClientId) -> User {
        let name = format!("User-{}", self.name_counter);
        self.name_counter += 1;
        let color = self.palette.next_color().to_owned();
        let user = User { id: client_id, name, color };

        match self.users.iter_mut().find(|u| u.id == client_id) {
            Some(existing) => *existing = user.clone(),
            None => self.users.push(user.clone()),
        }
        user
    }

    /// Drop a connection from the roster. Unknown ids are ignored.
    pub fn remove_user(&mut self, client_id: ClientId) -> Option<User> {
        let pos = self.users.iter().position(|u| u.id == client_id)?;
        Some(self.users.remove(pos))
    }

    #[must_use]
    pub fn list_users(&self) -> Vec<User> {
        self.users.clone()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

// =============================================================================
// HISTORY
// =============================================================================

impl Room {
    /// Append a committed stroke and invalidate the whole redo stack.
    /// Contents are not inspected; an empty stroke is stored as-is.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.history.push(stroke);
        self.redo_stack.clear();
    }

    /// Move the newest stroke from history to redo. Returns whether anything moved.
    pub fn undo(&mut self) -> bool {
        let Some(stroke) = self.history.pop() else {
            return false;
        };
        self.redo_stack.push(stroke);
        true
    }

    /// Move the newest undone stroke back onto history. Returns whether anything moved.
    pub fn redo(&mut self) -> bool {
        let Some(stroke) = self.redo_stack.pop() else {
            return false;
        };
        self.history.push(stroke);
        true
    }

    #[must_use]
    pub fn history(&self) -> &[Stroke] {
        &self.history
    }

    #[must_use]
    pub fn redo_stack(&self) -> &[Stroke] {
        &self.redo_stack
    }
}

// =============================================================================
// CURSORS
// =============================================================================

impl Room {
    pub fn place_cursor(&mut self, client_id: ClientId, cursor: Cursor) {
        self.cursors.insert(client_id, cursor);
    }

    /// Move an existing cursor. Returns `false` if the connection has none.
    pub fn move_cursor(&mut self, client_id: ClientId, x: Value, y: Value) -> bool {
        let Some(cursor) = self.cursors.get_mut(&client_id) else {
            return false;
        };
        cursor.x = x;
        cursor.y = y;
        true
    }

    pub fn remove_cursor(&mut self, client_id: ClientId) -> Option<Cursor> {
        self.cursors.remove(&client_id)
    }

    #[must_use]
    pub fn cursors(&self) -> &HashMap<ClientId, Cursor> {
        &self.cursors
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

impl Room {
    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            history_length: self.history.len(),
            redo_length: self.redo_stack.len(),
            users: self.list_users(),
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
