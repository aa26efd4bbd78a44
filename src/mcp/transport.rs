//! One JSON-RPC round trip against the tool server over HTTP.
//!
//! The server answers either with a single `application/json` document or
//! with a `text/event-stream` carrying one or more documents. The caller only
//! ever sees the `result` of the document whose id matches the request.

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{JsonRpcRequest, JsonRpcResponse};
use crate::error::{Result, SupportChatError};
use crate::sse::{event_stream, SseEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyKind {
    Json,
    EventStream,
    Other,
}

impl ReplyKind {
    fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("application/json") {
            ReplyKind::Json
        } else if content_type.contains("text/event-stream") {
            ReplyKind::EventStream
        } else {
            ReplyKind::Other
        }
    }
}

pub struct HttpTransport {
    server_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/event-stream, application/json"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Send `method` and wait for the matching reply.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(method, params);
        debug!(method, id = %request.id, "sending tool-server request");

        let response = self
            .http
            .post(&self.server_url)
            .json(&request)
            .send()
            .await
            .map_err(SupportChatError::from_network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupportChatError::Transport(format!(
                "HTTP error! status: {}, message: {}",
                status, body
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        match ReplyKind::from_content_type(&content_type) {
            ReplyKind::Json => {
                debug!(method, "tool server replied with a JSON document");
                let body = response
                    .bytes()
                    .await
                    .map_err(SupportChatError::from_network)?;
                let document: Value = serde_json::from_slice(&body).map_err(|e| {
                    SupportChatError::Transport(format!("Unexpected response format: {}", e))
                })?;
                interpret_document(document, &request.id)
            }
            ReplyKind::EventStream => {
                debug!(method, "tool server replied with an event stream");
                let events = event_stream(response.bytes_stream(), None);
                select_from_events(events, &request.id, method).await
            }
            ReplyKind::Other => Err(SupportChatError::Transport(format!(
                "Unexpected Content-Type: {}",
                content_type
            ))),
        }
    }
}

/// Pick the result for `request_id` out of a single reply document.
fn interpret_document(document: Value, request_id: &str) -> Result<Value> {
    let reply: JsonRpcResponse = serde_json::from_value(document.clone()).map_err(|_| {
        SupportChatError::Transport(format!("Unexpected response format: {}", document))
    })?;

    if reply.matches(request_id) {
        if let Some(error) = reply.error {
            return Err(SupportChatError::Transport(format!("MCP Error: {}", error)));
        }
        return Ok(reply.result.unwrap_or(Value::Null));
    }

    match reply.error {
        Some(error) => Err(SupportChatError::Transport(format!(
            "MCP Server Error: {}",
            error
        ))),
        None => Err(SupportChatError::Transport(format!(
            "Unexpected response format: {}",
            document
        ))),
    }
}

/// Consume events until one answers `request_id`.
///
/// Events that do not decode as a reply document are skipped, as are replies
/// to other requests. A server-level error ends the exchange immediately.
pub(crate) async fn select_from_events<S>(events: S, request_id: &str, method: &str) -> Result<Value>
where
    S: Stream<Item = Result<SseEvent>>,
{
    let mut events = Box::pin(events);

    while let Some(event) = events.next().await {
        let event = event?;
        if event.data.is_empty() {
            continue;
        }

        let reply: JsonRpcResponse = match serde_json::from_str(&event.data) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(method, error = %e, "skipping undecodable event");
                continue;
            }
        };

        if reply.matches(request_id) {
            if let Some(error) = reply.error {
                return Err(SupportChatError::Transport(format!("MCP Error: {}", error)));
            }
            return match reply.result {
                Some(result) => Ok(result),
                None => Err(SupportChatError::NoResponse {
                    method: method.to_string(),
                }),
            };
        }

        if reply.is_server_error() {
            let error = reply.error.unwrap_or(Value::Null);
            warn!(method, %error, "tool server reported an error");
            return Err(SupportChatError::Transport(format!(
                "MCP Server Error: {}",
                error
            )));
        }
    }

    Err(SupportChatError::NoResponse {
        method: method.to_string(),
    })
}
