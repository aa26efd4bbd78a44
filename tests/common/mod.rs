#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use supportchat::api::{CompletionRequest, CompletionResponse, FragmentStream, ModelGateway};
use supportchat::mcp::{ToolBackend, ToolResult};
use supportchat::models::{ToolCall, ToolDescriptor};
use supportchat::{Result, SupportChatError};

pub fn text(content: &str) -> CompletionResponse {
    CompletionResponse {
        content: Some(content.to_string()),
        tool_calls: None,
        finish_reason: Some("stop".to_string()),
    }
}

pub fn tool_calls(calls: &[(&str, &str, &str)]) -> CompletionResponse {
    CompletionResponse {
        content: None,
        tool_calls: Some(
            calls
                .iter()
                .map(|(id, name, arguments)| ToolCall::new(*id, *name, *arguments))
                .collect(),
        ),
        finish_reason: Some("tool_calls".to_string()),
    }
}

/// Model double that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<CompletionResponse>>>,
    streams: Mutex<VecDeque<Vec<Result<String>>>>,
    repeat: Option<CompletionResponse>,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new(replies: Vec<Result<CompletionResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Answer every non-streaming call with `reply`.
    pub fn repeating(reply: CompletionResponse) -> Self {
        Self {
            repeat: Some(reply),
            ..Default::default()
        }
    }

    pub fn with_stream(self, fragments: &[&str]) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(fragments.iter().map(|f| Ok(f.to_string())).collect());
        self
    }

    /// Queue a stream that yields `fragments` and then fails with `error`.
    pub fn with_failing_stream(self, fragments: &[&str], error: SupportChatError) -> Self {
        let mut items: Vec<Result<String>> = fragments.iter().map(|f| Ok(f.to_string())).collect();
        items.push(Err(error));
        self.streams.lock().unwrap().push_back(items);
        self
    }

    /// Make every non-streaming call wait before answering, so concurrent
    /// callers interleave.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn complete_calls(&self) -> usize {
        self.requests().iter().filter(|r| !r.stream).count()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.repeat) {
            (Some(reply), _) => reply,
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Ok(text("(script exhausted)")),
        }
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(request.streaming());
        let items = self.streams.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Tool double with a fixed catalog. `broken` always fails; other tools echo their arguments.
#[derive(Default)]
pub struct StaticTools {
    catalog: Vec<ToolDescriptor>,
    fail_initialize: bool,
    initialize_calls: AtomicUsize,
    initialized: Mutex<bool>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StaticTools {
    pub fn new(names: &[&str]) -> Self {
        Self {
            catalog: names
                .iter()
                .map(|name| ToolDescriptor {
                    name: name.to_string(),
                    description: Some(format!("{} tool", name)),
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {"id": {"type": "string"}}
                    })),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_initialize: true,
            ..Default::default()
        }
    }

    pub fn with_descriptor(mut self, descriptor: ToolDescriptor) -> Self {
        self.catalog.push(descriptor);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolBackend for StaticTools {
    async fn initialize(&self) -> Result<()> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize {
            return Err(SupportChatError::Transport("connection refused".to_string()));
        }
        *self.initialized.lock().unwrap() = true;
        Ok(())
    }

    async fn list_tools(&self) -> Vec<ToolDescriptor> {
        if *self.initialized.lock().unwrap() {
            self.catalog.clone()
        } else {
            Vec::new()
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if name == "broken" {
            return Err(SupportChatError::tool_execution(
                name,
                SupportChatError::Transport("MCP Error: boom".to_string()),
            ));
        }
        Ok(ToolResult::Structured(json!({"tool": name, "arguments": arguments})))
    }
}
