use super::*;
use crate::services::registry::RoomRegistry;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn unknown_room_reports_empty_and_is_not_created() {
    let state = AppState::new(RoomRegistry::new());
    let Json(body) = room_summary(State(state.clone()), Path("nowhere".into()))
        .await
        .expect("summary should succeed");

    assert_eq!(body, json!({"roomId": "nowhere", "historyLength": 0, "redoLength": 0, "users": []}));
    assert!(state.registry.get("nowhere").await.is_none());
}

#[tokio::test]
async fn known_room_reports_counts_and_users() {
    let state = AppState::new(RoomRegistry::new());
    let client = Uuid::new_v4();
    {
        let (_, mut live) = state.registry.acquire("r1").await;
        live.room.add_user(client);
    }

    let Json(body) = room_summary(State(state), Path("r1".into()))
        .await
        .expect("summary should succeed");

    assert_eq!(body["roomId"], "r1");
    assert_eq!(body["historyLength"], 0);
    assert_eq!(body["users"][0]["id"], client.to_string());
    assert_eq!(body["users"][0]["name"], "User-1");
}

#[tokio::test]
async fn api_error_maps_to_internal_server_error() {
    let handle: tokio::task::JoinHandle<()> = tokio::spawn(async { panic!("boom") });
    let join_err = handle.await.unwrap_err();
    let response = ApiError::from(join_err).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
