use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::models::{CompletionRequest, CompletionResponse, RequestBody};
use super::response::parse_completion;
use super::streaming::process_streaming_response;
use super::{FragmentStream, ModelGateway};
use crate::error::{Result, SupportChatError};

/// Gateway for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiGateway {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    request_timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(api_key: &str, base_url: &str, model: &str, request_timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SupportChatError::Config(
                "model provider API key is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| SupportChatError::Config(format!("Invalid authorization header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: completions_endpoint(base_url),
            model: model.to_string(),
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &CompletionRequest) -> Result<reqwest::Response> {
        request.validate()?;

        let body = RequestBody {
            model: &self.model,
            request,
        };
        let mut builder = self.http.post(&self.endpoint).json(&body);
        if !request.stream {
            builder = builder.timeout(self.request_timeout);
        }

        debug!(
            model = %self.model,
            stream = request.stream,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "calling model gateway"
        );
        let response = builder.send().await.map_err(SupportChatError::from_network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SupportChatError::Gateway { status, message });
        }

        Ok(response)
    }
}

/// Accepts a full `/chat/completions` URL, a `/v1` base, or a bare host.
pub fn completions_endpoint(base_url: &str) -> String {
    let endpoint = base_url.trim_end_matches('/');
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint)
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut request = request;
        request.stream = false;

        let response = self.send(&request).await?;
        let response_json: Value = response.json().await.map_err(SupportChatError::from_network)?;
        let completion = parse_completion(&response_json)?;

        debug!(
            finish_reason = completion.finish_reason.as_deref().unwrap_or("unknown"),
            tool_calls = completion.tool_calls.as_ref().map_or(0, Vec::len),
            "model gateway responded"
        );
        Ok(completion)
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream> {
        let request = request.streaming();
        let response = self.send(&request).await?;
        Ok(Box::pin(process_streaming_response(
            response,
            self.request_timeout,
        )))
    }
}
