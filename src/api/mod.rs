//! Chat API surface.
//!
//! Exposes the assistant over HTTP and WebSocket. Routes live under
//! `/api/`, the realtime upgrade at `/ws/connect`. The router is
//! composable — `api_router()` returns a `Router` that can be mounted on
//! any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
