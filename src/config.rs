//! Upstream configuration resolved from the environment.
//!
//! Values are read once per process. Lookup goes through a closure so tests
//! can supply a fixed environment.
use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: usize = 2;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// `None` when the credential is absent; callers report it rather than fail early.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: usize,
    /// Delay before the first retry; doubles on each further attempt.
    pub backoff: Duration,
    pub stream: bool,
    pub prefill: bool,
}

impl UpstreamConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Ok(Self {
            api_key: get("ANTHROPIC_API_KEY"),
            api_base: get("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: get("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_or(get("DRAPE_MAX_TOKENS"), "DRAPE_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            timeout: Duration::from_secs(parse_or(
                get("DRAPE_TIMEOUT_SECS"),
                "DRAPE_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_retries: parse_or(get("DRAPE_MAX_RETRIES"), "DRAPE_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            backoff: Duration::from_millis(parse_or(
                get("DRAPE_BACKOFF_MS"),
                "DRAPE_BACKOFF_MS",
                DEFAULT_BACKOFF_MS,
            )?),
            stream: parse_flag(get("DRAPE_STREAM"), "DRAPE_STREAM", true)?,
            prefill: parse_flag(get("DRAPE_PREFILL"), "DRAPE_PREFILL", false)?,
        })
    }

    /// Endpoint for the Messages API, tolerant of a trailing slash in the base.
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw.parse::<T>().with_context(|| format!("parse {key}={raw:?}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} must be a boolean (got {raw:?})")),
    }
}
