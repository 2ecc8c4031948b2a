//! Events: the closed message vocabulary for `CollabCanvas`.
//!
//! ARCHITECTURE
//! ============
//! Every WebSocket text frame is one JSON event. Clients send `ClientEvent`s,
//! the server answers and fans out `ServerEvent`s. Both are internally tagged
//! by the `event` field so a frame reads as `{"event":"undo"}` or
//! `{"event":"cursor-move","x":10,"y":20}`.
//!
//! DESIGN
//! ======
//! - One variant per event kind; dispatch is an exhaustive `match`, so a new
//!   event kind cannot be half-wired.
//! - Payload shapes are not validated. Stroke bodies and cursor coordinates
//!   stay raw JSON and are stored and relayed exactly as received, so only
//!   non-JSON text or an unknown `event` tag fails to decode.
//! - Decode errors go back to the sender only, as an `error` event carrying a
//!   grepable code from `ErrorCode`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{ClientId, Cursor, Stroke, StrokeInput, User};

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Inbound event from one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Bind the connection to a room. Missing or empty id means the default room.
    JoinRoom {
        #[serde(default)]
        room_id: Option<Value>,
    },
    /// A finished stroke to append to the room history.
    CommitStroke(StrokeInput),
    /// An in-progress stroke, relayed to peers only.
    PreviewStroke(StrokeInput),
    CursorMove {
        #[serde(default)]
        x: Value,
        #[serde(default)]
        y: Value,
    },
    Undo,
    Redo,
}

impl ClientEvent {
    /// Stable kebab-case name, used for log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::CommitStroke(_) => "commit-stroke",
            Self::PreviewStroke(_) => "preview-stroke",
            Self::CursorMove { .. } => "cursor-move",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// High-frequency events are logged at debug level only.
    #[must_use]
    pub fn is_high_frequency(&self) -> bool {
        matches!(self, Self::PreviewStroke(_) | Self::CursorMove { .. })
    }
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Outbound event, either a reply to one connection or a room broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection.
    Connected { client_id: ClientId },
    /// Full room state, sent to a connection right after it joins.
    CanvasState { history: Vec<Stroke>, redo_stack: Vec<Stroke>, users: Vec<User> },
    /// Current roster, sent to the rest of the room on join and leave.
    UserList { users: Vec<User> },
    /// A committed stroke, sent to every member including its author.
    NewDraw(Stroke),
    /// A preview stroke; replaces the author's previous preview on receipt.
    Drawing(Stroke),
    /// Every cursor in the room, keyed by connection.
    CursorPositions { cursors: HashMap<ClientId, Cursor> },
    /// History and redo stack after an undo or redo.
    CanvasUpdate { history: Vec<Stroke>, redo_stack: Vec<Stroke> },
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Build an `error` event from a typed error.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::Error { code: err.error_code().to_owned(), message: err.to_string() }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::CanvasState { .. } => "canvas-state",
            Self::UserList { .. } => "user-list",
            Self::NewDraw(_) => "new-draw",
            Self::Drawing(_) => "drawing",
            Self::CursorPositions { .. } => "cursor-positions",
            Self::CanvasUpdate { .. } => "canvas-update",
            Self::Error { .. } => "error",
        }
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured error events.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

/// Failure to turn an inbound text frame into a `ClientEvent`.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid event: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ErrorCode for EventError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_INVALID_EVENT",
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns `Malformed` if the text is not a JSON object or does not name a
/// known event.
pub fn decode(text: &str) -> Result<ClientEvent, EventError> {
    Ok(serde_json::from_str(text)?)
}

/// Whether a client-supplied value counts as not given: `null`, `false`, `0`
/// or the empty string.
#[must_use]
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
