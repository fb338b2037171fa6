//! Health and status endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/health` — liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub directory_url: String,
    pub active_sessions: usize,
    pub version: &'static str,
}

/// `GET /api/status` — runtime status for the front end.
pub async fn status(State(ctx): State<ApiContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success",
        directory_url: ctx.assistant.directory_url(),
        active_sessions: ctx.assistant.session_count(),
        version: config::APP_VERSION,
    })
}
