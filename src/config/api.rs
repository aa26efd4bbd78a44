use serde::{Deserialize, Serialize};

/// `api:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `mcp:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct McpConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
