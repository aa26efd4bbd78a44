use serde::{Deserialize, Serialize};

use crate::error::{Result, SupportChatError};
use crate::models::{Message, ToolCall, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    None,
    Auto,
    Required,
}

/// One completion call, independent of the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, temperature: f32, max_tokens: Option<u32>) -> Self {
        Self {
            messages,
            temperature,
            max_tokens,
            tools: None,
            tool_choice: None,
            stream: false,
        }
    }

    /// Offer `tools` with `auto` choice; an empty list offers nothing.
    pub fn with_tools(mut self, tools: &[ToolDefinition]) -> Self {
        if tools.is_empty() {
            self.tools = None;
            self.tool_choice = None;
        } else {
            self.tools = Some(tools.to_vec());
            self.tool_choice = Some(ToolChoice::Auto);
        }
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SupportChatError::InvalidRequest(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(SupportChatError::InvalidRequest(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wire body for OpenAI-compatible chat completion endpoints.
#[derive(Serialize)]
pub struct RequestBody<'a> {
    pub model: &'a str,
    #[serde(flatten)]
    pub request: &'a CompletionRequest,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    pub fn into_message(self) -> Message {
        Message::assistant_with_tools(self.content, self.tool_calls.unwrap_or_default())
    }
}

#[derive(Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct StreamChoice {
    pub delta: Option<Delta>,
}

#[derive(Deserialize)]
pub struct StreamResponse {
    pub choices: Option<Vec<StreamChoice>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionDefinition, Message};
    use serde_json::json;

    #[test]
    fn tool_choice_follows_tool_list() {
        let tool = ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "lookup_order".to_string(),
                description: String::new(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        };
        let base = CompletionRequest::new(vec![Message::user("hi")], 0.7, Some(100));

        let with = base.clone().with_tools(&[tool]);
        assert_eq!(with.tool_choice, Some(ToolChoice::Auto));

        let without = base.with_tools(&[]);
        assert_eq!(without.tool_choice, None);
        assert!(without.tools.is_none());
    }

    #[test]
    fn body_omits_absent_fields() {
        let request = CompletionRequest::new(vec![Message::user("hi")], 0.5, None);
        let body = serde_json::to_value(RequestBody {
            model: "gpt-4o-mini",
            request: &request,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5,
                "stream": false
            })
        );
    }

    #[test]
    fn validation_bounds() {
        let messages = vec![Message::user("hi")];
        assert!(CompletionRequest::new(messages.clone(), 2.0, Some(1)).validate().is_ok());
        assert!(CompletionRequest::new(messages.clone(), 2.5, None).validate().is_err());
        assert!(CompletionRequest::new(messages, 0.5, Some(0)).validate().is_err());
    }
}
