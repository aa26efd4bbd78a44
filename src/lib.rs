pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod models;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod sse;

pub use error::{Result, SupportChatError};
pub use orchestrator::{ChatOptions, ChatSession};
pub use service::{ChatService, TurnOutput};
