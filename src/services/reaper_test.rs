use super::*;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

#[tokio::test]
async fn disabled_reaper_spawns_nothing() {
    let registry = RoomRegistry::new();
    assert!(spawn_reaper_task(registry, None, Duration::from_millis(10)).is_none());
}

#[tokio::test]
async fn reaper_evicts_empty_rooms_and_keeps_occupied_ones() {
    let registry = RoomRegistry::new();
    registry.get_or_create("empty").await;
    let (tx, _rx) = mpsc::unbounded_channel();
    {
        let (_, mut live) = registry.acquire("occupied").await;
        live.attach(Uuid::new_v4(), tx);
    }

    let handle = spawn_reaper_task(registry.clone(), Some(Duration::ZERO), Duration::from_millis(10))
        .expect("reaper should spawn");

    timeout(Duration::from_secs(2), async {
        while registry.get("empty").await.is_some() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("empty room should be reaped");

    assert!(registry.get("occupied").await.is_some());
    handle.abort();
}
