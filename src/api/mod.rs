//! Boundary to the language-model provider.

pub mod client;
pub mod models;
pub mod response;
pub mod streaming;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;

pub use client::OpenAiGateway;
pub use models::{CompletionRequest, CompletionResponse, ToolChoice};

/// Incremental text produced by a streaming completion.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// One non-streaming completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// A streaming completion yielding text fragments only.
    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream>;
}
