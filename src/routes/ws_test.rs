use super::*;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::routes;
use crate::services::registry::RoomRegistry;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn new_session(registry: &RoomRegistry) -> (Session, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Session::new(registry.clone(), Uuid::new_v4(), tx), rx)
}

async fn spawn_server() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = routes::app(AppState::new(RoomRegistry::new()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn recv_json(stream: &mut WsStream) -> Value {
    let fut = async {
        loop {
            let msg = stream.next().await.expect("stream open").expect("frame");
            if let WsMessage::Text(_) = msg {
                return serde_json::from_str::<Value>(msg.to_text().expect("text")).expect("json");
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), fut).await.expect("timed out waiting for frame")
}

// =============================================================================
// process_inbound_text
// =============================================================================

#[tokio::test]
async fn invalid_json_replies_with_error_event() {
    let registry = RoomRegistry::new();
    let (mut session, mut rx) = new_session(&registry);

    let replies = process_inbound_text(&mut session, "not json").await;

    assert_eq!(replies.len(), 1);
    let ServerEvent::Error { code, .. } = &replies[0] else {
        panic!("expected error event, got {:?}", replies[0]);
    };
    assert_eq!(code, "E_INVALID_EVENT");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unknown_event_replies_with_error_and_leaves_session_unbound() {
    let registry = RoomRegistry::new();
    let (mut session, _rx) = new_session(&registry);

    let replies = process_inbound_text(&mut session, r#"{"event":"explode"}"#).await;

    assert!(matches!(replies.as_slice(), [ServerEvent::Error { .. }]));
    assert!(session.room_id().is_none());
}

#[tokio::test]
async fn join_room_frame_binds_session_and_queues_snapshot() {
    let registry = RoomRegistry::new();
    let (mut session, mut rx) = new_session(&registry);

    let replies = process_inbound_text(&mut session, r#"{"event":"join-room","roomId":"r1"}"#).await;

    assert!(replies.is_empty());
    assert_eq!(session.room_id(), Some("r1"));
    let Ok(ServerEvent::CanvasState { users, .. }) = rx.try_recv() else {
        panic!("expected canvas-state on the channel");
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, session.client_id());
}

// =============================================================================
// END TO END
// =============================================================================

#[tokio::test]
async fn websocket_connect_join_and_draw() {
    let addr = spawn_server().await;

    let (mut alice, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect alice");
    let connected = recv_json(&mut alice).await;
    assert_eq!(connected["event"], "connected");
    let alice_id = connected["clientId"].as_str().expect("client id").to_owned();

    alice
        .send(WsMessage::text(r#"{"event":"join-room","roomId":"e2e"}"#))
        .await
        .expect("send join");
    let state = recv_json(&mut alice).await;
    assert_eq!(state["event"], "canvas-state");
    assert_eq!(state["history"], Value::Array(Vec::new()));
    assert_eq!(state["users"][0]["id"], alice_id.as_str());

    let (mut bob, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect bob");
    assert_eq!(recv_json(&mut bob).await["event"], "connected");
    bob.send(WsMessage::text(r#"{"event":"join-room","roomId":"e2e"}"#))
        .await
        .expect("send join");
    let bob_state = recv_json(&mut bob).await;
    assert_eq!(bob_state["users"].as_array().map(Vec::len), Some(2));

    let roster = recv_json(&mut alice).await;
    assert_eq!(roster["event"], "user-list");
    assert_eq!(roster["users"].as_array().map(Vec::len), Some(2));

    alice
        .send(WsMessage::text(
            r##"{"event":"commit-stroke","points":[{"x":1,"y":2}],"color":"#000000","strokeWidth":3}"##,
        ))
        .await
        .expect("send stroke");

    let echoed = recv_json(&mut alice).await;
    let relayed = recv_json(&mut bob).await;
    assert_eq!(echoed["event"], "new-draw");
    assert_eq!(relayed["event"], "new-draw");
    assert_eq!(echoed["id"], relayed["id"]);
    assert_eq!(relayed["ownerId"], alice_id.as_str());
}

#[tokio::test]
async fn websocket_bad_frame_gets_error_without_disconnect() {
    let addr = spawn_server().await;
    let (mut stream, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    assert_eq!(recv_json(&mut stream).await["event"], "connected");

    stream.send(WsMessage::text("{")).await.expect("send garbage");
    let err = recv_json(&mut stream).await;
    assert_eq!(err["event"], "error");
    assert_eq!(err["code"], "E_INVALID_EVENT");

    stream.send(WsMessage::text(r#"{"event":"join-room"}"#)).await.expect("send join");
    assert_eq!(recv_json(&mut stream).await["event"], "canvas-state");
}

#[tokio::test]
async fn websocket_close_removes_user_from_peers() {
    let addr = spawn_server().await;

    let (mut alice, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect alice");
    recv_json(&mut alice).await;
    alice.send(WsMessage::text(r#"{"event":"join-room","roomId":"bye"}"#)).await.expect("join");
    recv_json(&mut alice).await;

    let (mut bob, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect bob");
    recv_json(&mut bob).await;
    bob.send(WsMessage::text(r#"{"event":"join-room","roomId":"bye"}"#)).await.expect("join");
    recv_json(&mut bob).await;
    assert_eq!(recv_json(&mut alice).await["event"], "user-list");

    bob.close(None).await.expect("close bob");

    let roster = recv_json(&mut alice).await;
    assert_eq!(roster["event"], "user-list");
    assert_eq!(roster["users"].as_array().map(Vec::len), Some(1));
    let cursors = recv_json(&mut alice).await;
    assert_eq!(cursors["event"], "cursor-positions");
    assert_eq!(cursors["cursors"].as_object().map(serde_json::Map::len), Some(1));
}
