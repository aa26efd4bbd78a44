use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::ToolDescriptor;

pub const JSONRPC_VERSION: &str = "2.0";

/// Id the tool server uses for errors that belong to no particular request.
pub const SERVER_ERROR_ID: &str = "server-error";

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build an envelope with a fresh id. Missing params are sent as `{}`.
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: params.unwrap_or_else(|| json!({})),
        }
    }
}

/// A reply document. Every field is optional because servers differ in what they send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl JsonRpcResponse {
    pub fn matches(&self, request_id: &str) -> bool {
        self.id.as_ref().and_then(Value::as_str) == Some(request_id)
    }

    pub fn is_server_error(&self) -> bool {
        self.error.is_some() && self.matches(SERVER_ERROR_ID)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// What a tool invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Structured(Value),
    Text(String),
}

impl ToolResult {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => ToolResult::Text(text),
            other => ToolResult::Structured(other),
        }
    }

    /// The text the model sees for this result.
    pub fn render(&self) -> String {
        match self {
            ToolResult::Text(text) => text.clone(),
            ToolResult::Structured(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolResult::Structured(value) => value.to_string(),
        }
    }

    /// Result fed back to the model when a tool call fails.
    pub fn failure(message: impl std::fmt::Display) -> Self {
        ToolResult::Structured(json!({
            "error": format!("Tool execution failed: {}", message)
        }))
    }
}
