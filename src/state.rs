//! Shared application state and canvas data model.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the room registry. Each live room pairs its canvas engine (`Room`)
//! with the outbound channels of the connections currently bound to it, so a
//! mutation and its fan-out happen under one per-room lock.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::ServerEvent;
use crate::services::registry::RoomRegistry;
use crate::services::room::Room;

/// Connection identity. One per WebSocket.
pub type ClientId = Uuid;

/// Opaque room identifier chosen by clients.
pub type RoomId = String;

/// Room used when a client names none.
pub const DEFAULT_ROOM: &str = "default";

// =============================================================================
// STROKES
// =============================================================================

/// Stroke as submitted by a client.
///
/// Only the identity fields are looked at, and only to see whether they are
/// present. Everything else (points, color, width, tool, anything a client
/// adds) stays raw JSON and is stored and relayed exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<Value>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// Stroke with its identity filled in. Never mutated once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: Value,
    pub owner_id: Value,
    /// Milliseconds since Unix epoch when assigned by the server.
    pub ts: Value,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Stroke {
    /// Length of `points` if it is an array, for logging.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.body.get("points").and_then(Value::as_array).map_or(0, Vec::len)
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: ClientId,
    pub name: String,
    pub color: String,
}

/// Cursor entry. Coordinates are relayed as the client sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: Value,
    pub y: Value,
    pub name: String,
    pub color: String,
}

impl Cursor {
    /// Off-canvas cursor for a user who has not moved yet.
    #[must_use]
    pub fn parked(user: &User) -> Self {
        Self { x: Value::from(-1), y: Value::from(-1), name: user.name.clone(), color: user.color.clone() }
    }
}

// =============================================================================
// LIVE ROOM
// =============================================================================

/// A room plus the connections bound to it.
pub struct LiveRoom {
    pub room: Room,
    /// Connected clients: `client_id` -> sender for outgoing events.
    pub clients: HashMap<ClientId, mpsc::UnboundedSender<ServerEvent>>,
    /// When the last client left. `None` while anyone is connected.
    pub idle_since: Option<Instant>,
    /// Set once the registry dropped this room; lookups must retry.
    pub reaped: bool,
}

impl LiveRoom {
    #[must_use]
    pub fn new(room_id: impl Into<RoomId>) -> Self {
        Self { room: Room::new(room_id), clients: HashMap::new(), idle_since: Some(Instant::now()), reaped: false }
    }

    /// Bind a connection's outbound channel to this room.
    pub fn attach(&mut self, client_id: ClientId, tx: mpsc::UnboundedSender<ServerEvent>) {
        self.clients.insert(client_id, tx);
        self.idle_since = None;
    }

    /// Unbind a connection. Starts the idle clock when the room empties.
    pub fn detach(&mut self, client_id: ClientId) {
        self.clients.remove(&client_id);
        if self.clients.is_empty() && self.idle_since.is_none() {
            self.idle_since = Some(Instant::now());
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone, Default)]
pub struct AppState {
    pub registry: RoomRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
