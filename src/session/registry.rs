use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::api::ModelGateway;
use crate::mcp::ToolSet;
use crate::orchestrator::ChatSession;

/// All live sessions, keyed by session id.
///
/// Sessions are created on first reference and live until deleted; there is
/// no expiry. The registry is constructed by the caller and shared by `Arc`.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<ChatSession>>>,
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolSet>,
    default_system_message: String,
}

impl SessionRegistry {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        tools: Arc<ToolSet>,
        default_system_message: impl Into<String>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            gateway,
            tools,
            default_system_message: default_system_message.into(),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<ChatSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the session for `id`, creating it if unseen.
    ///
    /// `system_message` only applies when the session is created here.
    pub fn get_or_create(&self, id: &str, system_message: Option<&str>) -> Arc<ChatSession> {
        let mut sessions = self.sessions();
        if let Some(session) = sessions.get(id) {
            return Arc::clone(session);
        }

        let system_message = system_message.unwrap_or(&self.default_system_message);
        let session = Arc::new(ChatSession::new(
            id,
            system_message,
            Arc::clone(&self.gateway),
            Arc::clone(&self.tools),
        ));
        sessions.insert(id.to_string(), Arc::clone(&session));
        info!(session = id, "session created");
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions().get(id).cloned()
    }

    /// Clear a session's history. Returns false if the session does not exist.
    pub async fn reset(&self, id: &str) -> bool {
        let Some(session) = self.get(id) else {
            return false;
        };
        session.reset().await;
        info!(session = id, "session reset");
        true
    }

    /// Remove a session. Returns false if the session does not exist.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.sessions().remove(id).is_some();
        if removed {
            info!(session = id, "session deleted");
        }
        removed
    }

    /// Snapshot of all sessions, oldest first.
    pub fn list_all(&self) -> Vec<Arc<ChatSession>> {
        let mut sessions: Vec<Arc<ChatSession>> = self.sessions().values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
