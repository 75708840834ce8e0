use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::Outcome;
use crate::services::conversation::{self, ReplyStatus};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub content: String,
    pub session_id: Option<String>,
    pub intent: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub session_closed: bool,
    pub status: ReplyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

// POST /api/chat
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = payload
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let intent = payload.intent.as_deref().unwrap_or("book");

    tracing::info!(session = %session_id, intent = %intent, "incoming chat message");

    let reply =
        conversation::begin_or_continue(&state, &session_id, intent, &payload.content).await;

    Json(ChatResponse {
        response: reply.text,
        session_id,
        session_closed: reply.session_closed,
        status: reply.status,
        outcome: reply.outcome,
    })
}

// DELETE /api/chat/:session_id
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    conversation::abandon(&state, &session_id).await;
    tracing::info!(session = %session_id, "session closed via API");
    StatusCode::NO_CONTENT
}
