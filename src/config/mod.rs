mod api;
mod defaults;
mod validation;

use crate::cli::Args;
use crate::error::Result;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use api::{ApiConfig, McpConfig};
pub use defaults::*;
pub use validation::{expand_env_refs, validate_limits};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub max_tool_iterations: Option<usize>,
}

/// Contents of `.supportchat.yaml` (or `.yml` / `.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_tool_iterations: usize,
    pub mcp_server_url: String,
    pub mcp_timeout: Duration,
    pub llm_timeout: Duration,
}

impl Config {
    /// Load `.env`, the first config file found, and the process environment.
    pub fn load(args: &Args) -> Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        let file = FileConfig::load()?;
        Self::resolve(args, file, |name| env::var(name).ok())
    }

    /// Merge CLI args > environment > file > defaults.
    pub fn resolve<F>(args: &Args, file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.expand_env(&lookup);

        let api_key = lookup("OPENAI_API_KEY")
            .or(file.api.key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;

        let api_base_url = args
            .api_base_url
            .clone()
            .or_else(|| lookup("OPENAI_BASE_URL"))
            .or(file.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = args
            .model
            .clone()
            .or_else(|| lookup("AI_MODEL"))
            .or(file.model.name)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let system_prompt = lookup("AI_SYSTEM_PROMPT")
            .or(file.model.system_prompt)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let temperature = parse_env(&lookup, "LLM_TEMPERATURE")?
            .or(file.model.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let max_tokens = parse_env(&lookup, "LLM_MAX_TOKENS")?
            .or(file.model.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let max_tool_iterations = match args.max_tool_iterations {
            Some(value) => Some(value),
            None => parse_env(&lookup, "MAX_TOOL_ITERATIONS")?,
        }
        .or(file.chat.max_tool_iterations)
        .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS);

        let mcp_server_url = args
            .server_url
            .clone()
            .or_else(|| lookup("MCP_SERVER_URL"))
            .or(file.mcp.server_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("MCP_SERVER_URL is not set"))?;

        let mcp_timeout_secs = parse_env(&lookup, "MCP_TIMEOUT_SECS")?
            .or(file.mcp.timeout_secs)
            .unwrap_or(DEFAULT_MCP_TIMEOUT_SECS);

        let llm_timeout_secs = parse_env(&lookup, "LLM_TIMEOUT_SECS")?
            .or(file.api.timeout_secs)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        validate_limits(temperature, max_tokens, max_tool_iterations)?;

        Ok(Config {
            api_key,
            api_base_url,
            model,
            system_prompt,
            temperature,
            max_tokens,
            max_tool_iterations,
            mcp_server_url,
            mcp_timeout: Duration::from_secs(mcp_timeout_secs),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
        })
    }
}

fn parse_env<T, F>(lookup: &F, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {}={:?}: {}", name, raw, e)),
        None => Ok(None),
    }
}

impl FileConfig {
    /// The first existing config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::config_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from(&path),
            None => Ok(FileConfig::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".supportchat.yaml"),
            PathBuf::from(".supportchat.yml"),
            PathBuf::from(".supportchat.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("supportchat");
            paths.push(config_dir.join("supportchat.yaml"));
            paths.push(config_dir.join("supportchat.yml"));
            paths.push(config_dir.join("supportchat.json"));
        }

        paths
    }

    /// Expand `${VAR}` references in string values.
    fn expand_env<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |value: &mut Option<String>| {
            if let Some(v) = value.as_mut() {
                *v = expand_env_refs(v, lookup);
            }
        };
        expand(&mut self.api.key);
        expand(&mut self.api.base_url);
        expand(&mut self.model.name);
        expand(&mut self.model.system_prompt);
        expand(&mut self.mcp.server_url);
        self
    }
}
