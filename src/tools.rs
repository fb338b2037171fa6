//! Tool surface exposed to hosting assistant runtimes.
//!
//! The catalog is static data: two tools, each with a typed argument
//! schema. Dispatch parses loose JSON arguments into a `ToolCall` the
//! assistant can execute; everything else about tool behavior lives in
//! `assistant.rs`.

use serde::Serialize;
use serde_json::Value;

/// Argument slot of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// A tool as advertised in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [ArgSpec],
}

/// Every tool wardline offers, in catalog order.
pub const CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "get_patient_list",
        description: "Get a list of patients, optionally filtered by name (partial matches supported).",
        args: &[
            ArgSpec {
                name: "patient_name",
                kind: "string",
                required: false,
                description: "Filter by patient name (case-insensitive substring).",
            },
            ArgSpec {
                name: "limit",
                kind: "integer",
                required: false,
                description: "Maximum number of patients to return (1-100, default 10).",
            },
        ],
    },
    ToolSpec {
        name: "list_tools",
        description: "List the available tools and their arguments.",
        args: &[],
    },
];

/// A parsed, validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetPatientList {
        patient_name: Option<String>,
        limit: Option<u32>,
    },
    ListTools,
}

/// Tool dispatch failures — surfaced to the calling runtime verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid argument {name}: expected {expected}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
    },
}

/// Parse a tool name plus loose JSON arguments into a `ToolCall`.
///
/// Missing optional arguments and explicit nulls are equivalent; unknown
/// argument keys are ignored.
pub fn parse_call(name: &str, arguments: &Value) -> Result<ToolCall, ToolError> {
    match name {
        "get_patient_list" => {
            let patient_name = match arguments.get("patient_name") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.trim().is_empty() => None,
                Some(Value::String(s)) => Some(s.trim().to_string()),
                Some(_) => {
                    return Err(ToolError::InvalidArgument {
                        name: "patient_name",
                        expected: "a string",
                    })
                }
            };
            let limit = match arguments.get("limit") {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => match n.as_u64() {
                    Some(v) if v <= u32::MAX as u64 => Some(v as u32),
                    _ => {
                        return Err(ToolError::InvalidArgument {
                            name: "limit",
                            expected: "a non-negative integer",
                        })
                    }
                },
                Some(_) => {
                    return Err(ToolError::InvalidArgument {
                        name: "limit",
                        expected: "a non-negative integer",
                    })
                }
            };
            Ok(ToolCall::GetPatientList {
                patient_name,
                limit,
            })
        }
        "list_tools" => Ok(ToolCall::ListTools),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}
