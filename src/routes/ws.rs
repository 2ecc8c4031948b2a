//! WebSocket handler: bidirectional event relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → decode → `Session::handle`
//! - Events queued on this client's channel → forward to the socket
//!
//! The session never writes to the socket directly. Everything it emits,
//! including replies meant only for this client, is queued on the channel,
//! so the socket sees events in the order the room produced them. Only
//! decode errors are answered inline.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `connected` with `clientId`
//! 2. Client sends events → session mutates its room and fans out
//! 3. Close or socket error → `Session::disconnect` → peers get the new roster

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::{self, ServerEvent};
use crate::services::session::Session;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for everything the rooms send this client.
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut session = Session::new(state.registry.clone(), client_id, client_tx);

    if send_event(&mut socket, &ServerEvent::Connected { client_id }).await.is_err() {
        return;
    }
    info!(%client_id, "ws: client connected");

    'conn: loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for reply in process_inbound_text(&mut session, text.as_str()).await {
                            if send_event(&mut socket, &reply).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    session.disconnect().await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and apply one inbound text frame, returning events for the sender
/// that bypass the room channels (decode errors only).
///
/// Kept apart from the socket so tests can drive dispatch end-to-end.
async fn process_inbound_text(session: &mut Session, text: &str) -> Vec<ServerEvent> {
    match event::decode(text) {
        Ok(event) => {
            session.handle(event).await;
            Vec::new()
        }
        Err(e) => {
            warn!(client_id = %session.client_id(), error = %e, "ws: invalid inbound frame");
            vec![ServerEvent::error_from(&e)]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, event = event.name(), "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|e| {
        warn!(error = %e, event = event.name(), "ws: send failed");
    })
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
