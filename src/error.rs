use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupportChatError {
    /// Missing or invalid configuration (credentials, URLs, limits).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed, mismatched or failed tool-server reply.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No response received for method {method}")]
    NoResponse { method: String },

    #[error("Error calling tool {tool}: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: Box<SupportChatError>,
    },

    /// The model provider answered with a non-success status.
    #[error("Gateway error (status {status}): {message}")]
    Gateway { status: u16, message: String },

    /// A completion reply without the expected choice/message shape.
    #[error("Unexpected gateway response: {0}")]
    GatewayResponse(String),

    #[error("Malformed event stream: {0}")]
    EventStream(String),

    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),

    #[error("Session {0} not found")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SupportChatError {
    pub fn tool_execution(tool: impl Into<String>, source: SupportChatError) -> Self {
        SupportChatError::ToolExecution {
            tool: tool.into(),
            source: Box::new(source),
        }
    }

    /// Network failures are reported as timeouts when reqwest says so.
    pub fn from_network(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SupportChatError::Timeout
        } else {
            SupportChatError::Network(err)
        }
    }
}

impl From<anyhow::Error> for SupportChatError {
    fn from(err: anyhow::Error) -> Self {
        SupportChatError::Config(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, SupportChatError>;
