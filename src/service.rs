//! Inbound operations for a chat front end.
//!
//! The service owns the session registry and the shared tool backend. Any
//! surface (the bundled REPL, an HTTP layer) drives conversations through it.

use futures::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::api::ModelGateway;
use crate::error::{Result, SupportChatError};
use crate::mcp::{ToolBackend, ToolSet};
use crate::models::Message;
use crate::orchestrator::ChatOptions;
use crate::session::SessionRegistry;

pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The answer to a turn, either complete or as incremental fragments.
pub enum TurnOutput {
    Text(String),
    Stream(AnswerStream),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub message_count: usize,
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub id: String,
    pub message_count: usize,
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub struct ChatService {
    registry: SessionRegistry,
    tools: Arc<ToolSet>,
    options: ChatOptions,
}

impl ChatService {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        tools: Arc<dyn ToolBackend>,
        system_message: impl Into<String>,
        options: ChatOptions,
    ) -> Self {
        let tools = Arc::new(ToolSet::new(tools));
        Self {
            registry: SessionRegistry::new(gateway, Arc::clone(&tools), system_message),
            tools,
            options,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Run a turn in the given session, creating it when needed.
    ///
    /// Without a session id a fresh one is generated. The id used is returned
    /// with the output so callers can continue the conversation.
    pub async fn start_or_continue_turn(
        &self,
        session_id: Option<&str>,
        message: &str,
        stream: bool,
    ) -> Result<(String, TurnOutput)> {
        if message.trim().is_empty() {
            return Err(SupportChatError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        let session_id = match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => Self::new_session_id(),
        };
        let session = self.registry.get_or_create(&session_id, None);
        debug!(session = %session_id, stream, "starting turn");

        let output = if stream {
            TurnOutput::Stream(Box::pin(
                session.chat_stream(message.to_string(), self.options.clone()),
            ))
        } else {
            TurnOutput::Text(session.chat(message, &self.options).await?)
        };

        Ok((session_id, output))
    }

    /// Clear a session's history. Unknown ids are a no-op.
    pub async fn reset_session(&self, session_id: &str) {
        self.registry.reset(session_id).await;
    }

    /// Remove a session. Unknown ids are a no-op.
    pub fn delete_session(&self, session_id: &str) {
        self.registry.delete(session_id);
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry
            .list_all()
            .into_iter()
            .map(|session| SessionSummary {
                id: session.id().to_string(),
                message_count: session.message_count(),
                last_message: session.last_message(),
            })
            .collect()
    }

    pub fn get_session_detail(&self, session_id: &str) -> Result<SessionDetail> {
        let session = self
            .registry
            .get(session_id)
            .ok_or_else(|| SupportChatError::NotFound(session_id.to_string()))?;
        let history = session.history();

        Ok(SessionDetail {
            id: session.id().to_string(),
            message_count: history.len(),
            history,
        })
    }

    /// The tool catalog as advertised by the server, fetching it if needed.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let backend = self.tools.backend();
        backend.initialize().await?;
        Ok(backend
            .list_tools()
            .await
            .into_iter()
            .map(|tool| ToolInfo {
                description: tool.description.unwrap_or_default(),
                parameters: tool.input_schema.unwrap_or_else(|| json!({})),
                name: tool.name,
            })
            .collect())
    }
}
