//! Chat API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! REST routes are nested under `/api/`; the WebSocket upgrade lives at
//! `/ws/connect`. CORS is wide open — the front end is served from
//! wherever, and nothing here relies on ambient browser credentials.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::api::websocket;
use crate::assistant::Assistant;

/// Build the chat API router around one shared assistant.
pub fn api_router(assistant: Arc<Assistant>) -> Router {
    let ctx = ApiContext::new(assistant);

    let api = Router::new()
        .route("/health", get(endpoints::status::health))
        .route("/status", get(endpoints::status::status))
        .route("/chat", post(endpoints::chat::send))
        .route("/clear-chat", post(endpoints::chat::clear))
        .route("/tools", get(endpoints::tools::catalog))
        .route("/tools/call", post(endpoints::tools::call))
        .with_state(ctx.clone());

    let ws = Router::new()
        .route("/ws/connect", get(websocket::ws_upgrade))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .merge(ws)
        .layer(CorsLayer::permissive())
}
