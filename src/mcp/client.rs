use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::transport::HttpTransport;
use super::types::{ToolListResponse, ToolResult};
use crate::error::{Result, SupportChatError};
use crate::models::ToolDescriptor;

const METHOD_LIST_TOOLS: &str = "tools/list";
const METHOD_CALL_TOOL: &str = "tools/call";

/// What the orchestrator needs from a tool server.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the tool catalog once. Later calls return immediately.
    async fn initialize(&self) -> Result<()>;

    /// The cached catalog, empty before a successful `initialize`.
    async fn list_tools(&self) -> Vec<ToolDescriptor>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult>;
}

enum Catalog {
    Uninitialized,
    Ready(Vec<ToolDescriptor>),
}

pub struct ToolClient {
    transport: Mutex<Option<Arc<HttpTransport>>>,
    catalog: AsyncMutex<Catalog>,
}

impl ToolClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(server_url, timeout)?;
        Ok(Self {
            transport: Mutex::new(Some(Arc::new(transport))),
            catalog: AsyncMutex::new(Catalog::Uninitialized),
        })
    }

    pub fn server_url(&self) -> Option<String> {
        self.transport()
            .ok()
            .map(|transport| transport.server_url().to_string())
    }

    pub async fn is_initialized(&self) -> bool {
        matches!(*self.catalog.lock().await, Catalog::Ready(_))
    }

    /// Drop the HTTP client and its pooled connections. Safe to call repeatedly.
    pub fn close(&self) {
        let released = self
            .transport
            .lock()
            .map(|mut slot| slot.take().is_some())
            .unwrap_or(false);
        if released {
            debug!("tool client closed");
        }
    }

    fn transport(&self) -> Result<Arc<HttpTransport>> {
        self.transport
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or_else(|| SupportChatError::Transport("tool client is closed".to_string()))
    }
}

/// Accept either `{"tools": [...]}` or a bare list; anything else is an empty catalog.
pub fn parse_tool_list(result: Value) -> Result<Vec<ToolDescriptor>> {
    if result.get("tools").is_some() {
        let list: ToolListResponse = serde_json::from_value(result)?;
        Ok(list.tools)
    } else if result.is_array() {
        Ok(serde_json::from_value(result)?)
    } else {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ToolBackend for ToolClient {
    async fn initialize(&self) -> Result<()> {
        // Held across the fetch so concurrent callers share one round trip
        let mut catalog = self.catalog.lock().await;
        if let Catalog::Ready(_) = *catalog {
            return Ok(());
        }

        let transport = self.transport()?;
        let result = transport.request(METHOD_LIST_TOOLS, None).await.map_err(|e| {
            warn!(error = %e, "tool discovery failed");
            e
        })?;
        let tools = parse_tool_list(result)?;

        info!(count = tools.len(), server = transport.server_url(), "tool catalog loaded");
        for tool in &tools {
            debug!(tool = %tool.name, "discovered tool");
        }
        *catalog = Catalog::Ready(tools);
        Ok(())
    }

    async fn list_tools(&self) -> Vec<ToolDescriptor> {
        match &*self.catalog.lock().await {
            Catalog::Ready(tools) => tools.clone(),
            Catalog::Uninitialized => Vec::new(),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let transport = self
            .transport()
            .map_err(|e| SupportChatError::tool_execution(name, e))?;
        let params = json!({
            "name": name,
            "arguments": arguments,
        });

        transport
            .request(METHOD_CALL_TOOL, Some(params))
            .await
            .map(ToolResult::from_value)
            .map_err(|e| SupportChatError::tool_execution(name, e))
    }
}
