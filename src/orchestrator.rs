//! The tool-calling loop for one conversation.
//!
//! A turn appends the user message, then alternates between model calls and
//! tool execution until the model answers in plain text or the iteration cap
//! is reached. Only the user message and the final assistant text are kept in
//! history; tool traffic lives in the turn's working list.

use chrono::{DateTime, Local};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::api::{CompletionRequest, CompletionResponse, ModelGateway};
use crate::error::Result;
use crate::mcp::{ToolBackend, ToolResult, ToolSet};
use crate::models::{Message, Role, ToolCall, ToolDefinition};

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Answer used when the iteration cap is hit and the model produced no usable text.
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I encountered an issue processing your request.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_tool_iterations: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

enum LoopOutcome {
    Answered(CompletionResponse),
    Exhausted,
}

pub struct ChatSession {
    id: String,
    system_message: String,
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolSet>,
    history: Mutex<Vec<Message>>,
    turn: AsyncMutex<()>,
    created_at: DateTime<Local>,
    last_activity: Mutex<DateTime<Local>>,
}

impl ChatSession {
    pub fn new(
        id: impl Into<String>,
        system_message: impl Into<String>,
        gateway: Arc<dyn ModelGateway>,
        tools: Arc<ToolSet>,
    ) -> Self {
        let now = Local::now();
        Self {
            id: id.into(),
            system_message: system_message.into(),
            gateway,
            tools,
            history: Mutex::new(Vec::new()),
            turn: AsyncMutex::new(()),
            created_at: now,
            last_activity: Mutex::new(now),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Local> {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the conversation history.
    pub fn history(&self) -> Vec<Message> {
        self.history_guard().clone()
    }

    pub fn message_count(&self) -> usize {
        self.history_guard().len()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.history_guard().last().cloned()
    }

    /// Clear the history once any running turn has finished.
    /// The system message survives.
    pub async fn reset(&self) {
        let _turn = self.turn.lock().await;
        self.history_guard().clear();
        self.touch();
    }

    fn history_guard(&self) -> MutexGuard<'_, Vec<Message>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Local::now();
    }

    /// Record the user message and build the outgoing message list.
    fn begin_turn(&self, user_message: &str) -> Vec<Message> {
        let mut history = self.history_guard();
        history.push(Message::user(user_message));

        let mut working = Vec::with_capacity(history.len() + 1);
        if !self.system_message.is_empty() {
            working.push(Message::system(self.system_message.clone()));
        }
        working.extend(history.iter().cloned());
        drop(history);

        self.touch();
        working
    }

    fn commit_answer(&self, answer: &str) {
        self.history_guard().push(Message::assistant(answer));
        self.touch();
    }

    /// Run one non-streaming turn and return the assistant's answer.
    pub async fn chat(&self, user_message: &str, options: &ChatOptions) -> Result<String> {
        let _turn = self.turn.lock().await;

        let mut working = self.begin_turn(user_message);
        let turn_start = working.len();
        let tools = self.tools.definitions().await?;

        let answer = match self.run_tool_loop(&mut working, tools, options).await? {
            LoopOutcome::Answered(response) => response.content.unwrap_or_default(),
            LoopOutcome::Exhausted => {
                warn!(
                    session = %self.id,
                    iterations = options.max_tool_iterations,
                    "tool iteration cap reached"
                );
                fallback_answer(&working[turn_start..])
            }
        };

        self.commit_answer(&answer);
        Ok(answer)
    }

    /// Run one turn and stream the final answer.
    ///
    /// Tool calls are resolved with non-streaming completions first; the
    /// answer is then requested in streaming mode over the resolved message
    /// list. History receives the answer only once the stream has been fully
    /// consumed. Dropping the stream early leaves history without it.
    pub fn chat_stream(
        self: Arc<Self>,
        user_message: String,
        options: ChatOptions,
    ) -> impl Stream<Item = Result<String>> + Send + 'static {
        async_stream::try_stream! {
            let _turn = self.turn.lock().await;
            let mut pending = PendingAnswer::new(&self.id);

            let mut working = self.begin_turn(&user_message);
            let tools = self.tools.definitions().await?;
            if let LoopOutcome::Exhausted = self.run_tool_loop(&mut working, tools, &options).await? {
                warn!(
                    session = %self.id,
                    iterations = options.max_tool_iterations,
                    "tool iteration cap reached before streaming"
                );
            }

            let request = CompletionRequest::new(working, options.temperature, options.max_tokens);
            let mut fragments = self.gateway.complete_stream(request).await?;

            let mut full_response = String::new();
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                full_response.push_str(&fragment);
                yield fragment;
            }

            self.commit_answer(&full_response);
            pending.committed = true;
        }
    }

    async fn run_tool_loop(
        &self,
        working: &mut Vec<Message>,
        tools: &[ToolDefinition],
        options: &ChatOptions,
    ) -> Result<LoopOutcome> {
        for iteration in 1..=options.max_tool_iterations {
            let request =
                CompletionRequest::new(working.clone(), options.temperature, options.max_tokens)
                    .with_tools(tools);
            let response = self.gateway.complete(request).await?;

            if !response.has_tool_calls() {
                debug!(session = %self.id, iteration, "model answered without tool calls");
                return Ok(LoopOutcome::Answered(response));
            }

            let calls = response.tool_calls.clone().unwrap_or_default();
            debug!(session = %self.id, iteration, calls = calls.len(), "model requested tools");
            working.push(response.into_message());
            let results = self.execute_tool_calls(&calls).await;
            working.extend(results);
        }

        Ok(LoopOutcome::Exhausted)
    }

    /// Execute every requested call. Failures become error results for the model.
    async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Vec<Message> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let name = call.function.name.as_str();
            let arguments = decode_arguments(&call.function.arguments);
            info!(session = %self.id, tool = name, "calling tool");

            let result = match self.tools.backend().call_tool(name, arguments).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(session = %self.id, tool = name, error = %e, "tool call failed");
                    ToolResult::failure(e)
                }
            };

            results.push(Message::tool_result(&call.id, name, result.render()));
        }

        results
    }
}

/// Decode a tool-call argument payload. Anything but a JSON object becomes `{}`.
pub fn decode_arguments(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            debug!(arguments = raw, "tool arguments are not a JSON object; using {{}}");
            json!({})
        }
    }
}

/// Newest non-empty assistant text of the turn, or the fixed apology.
fn fallback_answer(turn: &[Message]) -> String {
    turn.iter()
        .rev()
        .filter(|message| message.role == Role::Assistant)
        .map(Message::text)
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_ANSWER.to_string())
}

struct PendingAnswer<'a> {
    session_id: &'a str,
    committed: bool,
}

impl<'a> PendingAnswer<'a> {
    fn new(session_id: &'a str) -> Self {
        Self {
            session_id,
            committed: false,
        }
    }
}

impl Drop for PendingAnswer<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(session = self.session_id, "streamed answer discarded before completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolCall;

    #[test]
    fn malformed_arguments_decode_to_empty_object() {
        assert_eq!(decode_arguments("{"), json!({}));
        assert_eq!(decode_arguments(""), json!({}));
        assert_eq!(decode_arguments("[1, 2]"), json!({}));
        assert_eq!(
            decode_arguments(r#"{"category":"Monitors"}"#),
            json!({"category": "Monitors"})
        );
    }

    #[test]
    fn fallback_skips_tool_results() {
        let turn = vec![
            Message::assistant_with_tools(
                Some("Let me check.".to_string()),
                vec![ToolCall::new("call_1", "search", "{}")],
            ),
            Message::tool_result("call_1", "search", "{\"status\": \"ok\"}"),
        ];
        assert_eq!(fallback_answer(&turn), "Let me check.");
    }

    #[test]
    fn fallback_defaults_to_apology() {
        let turn = vec![
            Message::assistant_with_tools(None, vec![ToolCall::new("call_1", "search", "{}")]),
            Message::tool_result("call_1", "search", "result"),
        ];
        assert_eq!(fallback_answer(&turn), FALLBACK_ANSWER);
    }
}
