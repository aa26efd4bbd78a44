use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::client::ToolBackend;
use crate::error::Result;
use crate::models::{FunctionDefinition, ToolDefinition, ToolDescriptor};

/// A tool backend shared by every session, with its catalog converted once.
pub struct ToolSet {
    backend: Arc<dyn ToolBackend>,
    definitions: OnceCell<Vec<ToolDefinition>>,
}

impl ToolSet {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self {
            backend,
            definitions: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ToolBackend> {
        &self.backend
    }

    /// Function-calling definitions, fetched and converted on first use.
    /// A failed fetch is not cached.
    pub async fn definitions(&self) -> Result<&[ToolDefinition]> {
        let definitions = self
            .definitions
            .get_or_try_init(|| async {
                self.backend.initialize().await?;
                let catalog = self.backend.list_tools().await;
                Ok::<_, crate::error::SupportChatError>(to_tool_definitions(&catalog))
            })
            .await?;
        Ok(definitions)
    }
}

/// Convert the tool server's catalog into function-calling definitions.
pub fn to_tool_definitions(tools: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    tools.iter().map(to_tool_definition).collect()
}

pub fn to_tool_definition(tool: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: normalize_schema(tool.input_schema.as_ref()),
        },
    }
}

/// Ensure the parameter schema is an object schema.
///
/// Object schemas pass through. Schemas without an object type have their
/// `properties` and `required` lifted into a fresh object schema; missing or
/// empty schemas become an object with no properties.
pub fn normalize_schema(schema: Option<&Value>) -> Value {
    let Some(Value::Object(map)) = schema else {
        return empty_object_schema();
    };
    if map.is_empty() {
        return empty_object_schema();
    }
    if map.get("type").and_then(Value::as_str) == Some("object") {
        return Value::Object(map.clone());
    }

    let mut wrapped = Map::new();
    wrapped.insert("type".to_string(), json!("object"));
    wrapped.insert(
        "properties".to_string(),
        map.get("properties").cloned().unwrap_or_else(|| json!({})),
    );
    wrapped.insert(
        "required".to_string(),
        map.get("required").cloned().unwrap_or_else(|| json!([])),
    );
    Value::Object(wrapped)
}

fn empty_object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}
