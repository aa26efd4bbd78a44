use serde_json::Value;

use super::models::CompletionResponse;
use crate::error::{Result, SupportChatError};
use crate::models::ToolCall;

fn first_choice(response_json: &Value) -> Result<&Value> {
    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| SupportChatError::GatewayResponse("No choices in response".to_string()))?;

    choices
        .first()
        .ok_or_else(|| SupportChatError::GatewayResponse("Empty choices array".to_string()))
}

fn first_message(response_json: &Value) -> Result<&Value> {
    first_choice(response_json)?
        .get("message")
        .ok_or_else(|| SupportChatError::GatewayResponse("No message in response".to_string()))
}

/// Parse a non-streaming response and extract tool calls if present
pub fn parse_tool_calls(response_json: &Value) -> Result<Option<Vec<ToolCall>>> {
    let message = first_message(response_json)?;

    match message.get("tool_calls").and_then(|tc| tc.as_array()) {
        Some(tool_calls) if !tool_calls.is_empty() => {
            let calls = tool_calls
                .iter()
                .map(|tc| serde_json::from_value::<ToolCall>(tc.clone()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(calls))
        }
        _ => Ok(None),
    }
}

/// Extract content from a non-streaming response
pub fn extract_content(response_json: &Value) -> Result<Option<String>> {
    let message = first_message(response_json)?;
    Ok(message
        .get("content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string()))
}

pub fn extract_finish_reason(response_json: &Value) -> Result<Option<String>> {
    Ok(first_choice(response_json)?
        .get("finish_reason")
        .and_then(|r| r.as_str())
        .map(|s| s.to_string()))
}

pub fn parse_completion(response_json: &Value) -> Result<CompletionResponse> {
    Ok(CompletionResponse {
        content: extract_content(response_json)?,
        tool_calls: parse_tool_calls(response_json)?,
        finish_reason: extract_finish_reason(response_json)?,
    })
}
