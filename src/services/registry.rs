//! Room registry: lazy creation, lookup, and idle reaping.
//!
//! DESIGN
//! ======
//! The map lock is held only to find or insert a room; all room work happens
//! under that room's own mutex, so rooms never contend with each other.
//!
//! Reaping removes rooms that have had no connected clients for a while. A
//! reaped room is flagged before it leaves the map, and `acquire` retries
//! when it locks a flagged room, so a join racing the reaper never lands in
//! an orphan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::info;

use crate::event::is_unset;
use crate::services::room::RoomSummary;
use crate::state::{DEFAULT_ROOM, LiveRoom, RoomId};

pub type SharedRoom = Arc<Mutex<LiveRoom>>;

/// Map a requested room id to the id actually used. Unset ids mean the
/// default room; non-string ids are keyed by their JSON text.
#[must_use]
pub fn resolve_room_id(requested: Option<Value>) -> RoomId {
    match requested.filter(|id| !is_unset(id)) {
        Some(Value::String(id)) => id,
        Some(other) => other.to_string(),
        None => DEFAULT_ROOM.to_owned(),
    }
}

#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<RoomId, SharedRoom>>>,
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a room, creating an empty one if the id is unseen.
    pub async fn get_or_create(&self, room_id: &str) -> SharedRoom {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return room.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| {
                info!(%room_id, "room created");
                Arc::new(Mutex::new(LiveRoom::new(room_id)))
            })
            .clone()
    }

    /// Look up a room without creating it.
    pub async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Lock a live room, creating it if needed. Never returns a reaped room.
    pub async fn acquire(&self, room_id: &str) -> (SharedRoom, OwnedMutexGuard<LiveRoom>) {
        loop {
            let shared = self.get_or_create(room_id).await;
            let guard = shared.clone().lock_owned().await;
            if !guard.reaped {
                return (shared, guard);
            }
        }
    }

    /// Read-only summary. Unknown rooms report as empty and are not created.
    pub async fn summary(&self, room_id: &str) -> RoomSummary {
        let Some(shared) = self.get(room_id).await else {
            return RoomSummary::empty(room_id);
        };
        shared.lock().await.room.summary()
    }

    /// Remove rooms with no clients whose idle time is at least `ttl`.
    /// Rooms locked by in-flight work are skipped until the next pass.
    pub async fn reap_idle(&self, ttl: Duration) -> Vec<RoomId> {
        let now = Instant::now();
        let mut rooms = self.rooms.write().await;
        let mut reaped = Vec::new();

        rooms.retain(|room_id, shared| {
            let Ok(mut live) = shared.try_lock() else {
                return true;
            };
            let expired = live.clients.is_empty()
                && live
                    .idle_since
                    .is_some_and(|since| now.saturating_duration_since(since) >= ttl);
            if expired {
                live.reaped = true;
                reaped.push(room_id.clone());
            }
            !expired
        });

        if !reaped.is_empty() {
            info!(count = reaped.len(), remaining = rooms.len(), "reaped idle rooms");
        }
        reaped
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
