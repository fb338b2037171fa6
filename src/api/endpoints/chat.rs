//! Chat endpoints.
//!
//! - `POST /api/chat` — process one message, return the reply
//! - `POST /api/clear-chat` — clear one session's history, or all

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Longest accepted chat message, in bytes.
const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Callers keep conversation context by passing the same id back;
    /// a fresh id is minted (and returned) when absent.
    pub session_id: Option<String>,
}

/// One payload shape for success and failure — the same shape the
/// WebSocket events use, so clients share a decoder.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session_id: String,
}

/// `POST /api/chat` — process one chat message.
///
/// Upstream failures come back as `status: "error"` with a stable,
/// user-readable message (HTTP 200 — the chat call itself succeeded in
/// producing a reply shape). Only an unusable request is a 4xx.
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_LEN} chars)"
        )));
    }

    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match ctx.assistant.process_message(&session_id, message).await {
        Ok(reply) => Ok(Json(ChatResponse {
            status: "success",
            response: Some(reply),
            error: None,
            session_id,
        })),
        Err(err) => {
            tracing::warn!(%session_id, error = %err, "chat message failed");
            Ok(Json(ChatResponse {
                status: "error",
                response: None,
                error: Some(err.user_message()),
                session_id,
            }))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearChatRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearChatResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub cleared_sessions: usize,
}

/// `POST /api/clear-chat` — clear conversation history.
///
/// With a `session_id` only that session is dropped; with no body (or no
/// id) every session goes.
pub async fn clear(
    State(ctx): State<ApiContext>,
    body: Option<Json<ClearChatRequest>>,
) -> Json<ClearChatResponse> {
    let session_id = body.and_then(|Json(req)| req.session_id);
    let cleared = ctx.assistant.clear_history(session_id.as_deref());
    tracing::info!(cleared, "conversation history cleared");

    Json(ClearChatResponse {
        status: "success",
        message: "Conversation history cleared",
        cleared_sessions: cleared,
    })
}
