pub use crate::orchestrator::{DEFAULT_MAX_TOOL_ITERATIONS, DEFAULT_TEMPERATURE};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MCP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful customer support assistant for an \
online store. Use the available tools to look up products, orders and customer details \
before answering. Be concise and friendly, and say so plainly when you cannot find \
something.";
