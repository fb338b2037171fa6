//! Tool surface endpoints.
//!
//! - `GET /api/tools` — the tool catalog
//! - `POST /api/tools/call` — invoke one tool by name with JSON arguments

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::fields::CanonicalPatient;
use crate::tools::{self, ToolSpec};

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub tools: &'static [ToolSpec],
}

/// `GET /api/tools` — list the available tools.
pub async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        tools: tools::CATALOG,
    })
}

#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Canonical records, when the tool produced any — the
    /// machine-readable counterpart of `response`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<CanonicalPatient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/tools/call` — invoke a tool.
///
/// Unknown tools and malformed arguments are 400s; upstream failures
/// come back as `status: "error"` in the payload, like the chat surface.
pub async fn call(
    State(ctx): State<ApiContext>,
    Json(req): Json<ToolCallRequest>,
) -> Result<Json<ToolCallResponse>, ApiError> {
    let call = tools::parse_call(&req.name, &req.arguments)?;

    match ctx.assistant.invoke_tool(call).await {
        Ok(reply) => Ok(Json(ToolCallResponse {
            status: "success",
            response: Some(reply.text),
            records: reply.records,
            error: None,
        })),
        Err(err) => {
            tracing::warn!(tool = %req.name, error = %err, "tool call failed");
            Ok(Json(ToolCallResponse {
                status: "error",
                response: None,
                records: None,
                error: Some(err.user_message()),
            }))
        }
    }
}
