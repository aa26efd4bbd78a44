pub mod client;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::{ToolBackend, ToolClient};
pub use tools::{to_tool_definitions, ToolSet};
pub use types::ToolResult;
