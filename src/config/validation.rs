use anyhow::{bail, Result};
use regex::Regex;
use std::sync::OnceLock;

fn env_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern is valid"))
}

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as written.
pub fn expand_env_refs<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_reference()
        .replace_all(value, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn validate_limits(temperature: f32, max_tokens: u32, max_tool_iterations: usize) -> Result<()> {
    if !(0.0..=2.0).contains(&temperature) {
        bail!("temperature must be between 0 and 2, got {}", temperature);
    }
    if max_tokens == 0 {
        bail!("max_tokens must be greater than 0");
    }
    if max_tool_iterations == 0 {
        bail!("max_tool_iterations must be at least 1");
    }
    Ok(())
}
