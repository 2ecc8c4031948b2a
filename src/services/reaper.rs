//! Reaper service: background eviction of idle rooms.
//!
//! DESIGN
//! ======
//! Rooms are created lazily and otherwise live for the whole process. When an
//! idle TTL is configured, a background task periodically drops rooms that
//! have had no connected clients for at least that long, along with their
//! history. A room with any connected client is never touched.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::services::registry::RoomRegistry;

/// Spawn the reaper. Returns `None` when reaping is disabled.
pub fn spawn_reaper_task(registry: RoomRegistry, ttl: Option<Duration>, interval: Duration) -> Option<JoinHandle<()>> {
    let Some(ttl) = ttl else {
        info!("room reaping disabled");
        return None;
    };
    info!(ttl_secs = ttl.as_secs(), interval_secs = interval.as_secs(), "room reaper configured");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let reaped = registry.reap_idle(ttl).await;
            for room_id in &reaped {
                debug!(%room_id, "room reaped");
            }
        }
    }))
}

#[cfg(test)]
#[path = "reaper_test.rs"]
mod tests;
