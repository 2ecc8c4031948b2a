//! Read-only room diagnostics.
//!
//! `GET /room/{id}` reports history and redo sizes plus the roster. It never
//! creates a room. The lookup runs in its own task so a failure while
//! reading surfaces as a 500 instead of taking the connection down.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::event::ErrorCode;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("room query failed: {0}")]
    Query(#[from] tokio::task::JoinError),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        "E_INTERNAL"
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, code = self.error_code(), "room query failed");
        let body = serde_json::json!({ "error": self.to_string(), "code": self.error_code() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// `GET /room/{id}`: summary of one room.
pub async fn room_summary(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let registry = state.registry.clone();
    let summary = tokio::spawn(async move { registry.summary(&room_id).await }).await?;
    Ok(Json(serde_json::to_value(summary)?))
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
