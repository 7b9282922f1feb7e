//! Messages API client for tutorial generation.
//!
//! Sends an image plus the fixed tutorial prompt upstream and returns the
//! model's raw text, ready for the extraction pipeline.
//!
//! # Error Recovery
//!
//! Transport failures and overload/server statuses (429, 5xx) are retried
//! with exponential backoff up to `max_retries` times. Other client errors
//! are returned immediately since repeating the request cannot fix them.
//! Output that decodes badly is not retried here; that decision belongs to
//! the caller once the pipeline reports a bad generation.
pub mod prefill;
pub mod sse;

use crate::config::UpstreamConfig;
use crate::document::{Area, Icon};
use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use prefill::{reattach_prefill, TUTORIAL_PREFILL};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const ERROR_SNIPPET_CHARS: usize = 200;

// Prompt template loaded at compile time
const TUTORIAL_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/tutorial.md"
));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream stream failed: {0}")]
    Stream(String),
    #[error("upstream response malformed: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Whether a repeated request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Transport(_) | UpstreamError::Stream(_) => true,
            UpstreamError::Malformed(_) => false,
        }
    }
}

/// Raw model text plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOutput {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Base64 image ready to embed in a request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub media_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Read and encode an image, inferring the media type from the
    /// extension when none is given.
    pub fn from_file(path: &Path, media_type: Option<&str>) -> Result<Self> {
        let media_type = match media_type {
            Some(media_type) => media_type.trim().to_string(),
            None => infer_media_type(path)
                .ok_or_else(|| {
                    anyhow!(
                        "cannot infer media type for {} (pass --media-type)",
                        path.display()
                    )
                })?
                .to_string(),
        };
        let bytes = fs::read(path).with_context(|| format!("read image {}", path.display()))?;
        if bytes.is_empty() {
            return Err(anyhow!("image {} is empty", path.display()));
        }
        Ok(Self {
            media_type,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }
}

fn infer_media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Fill the prompt template with the allowed icon and area values.
pub fn tutorial_prompt() -> String {
    let join = |values: Vec<&str>| values.join("/");
    TUTORIAL_PROMPT
        .replace("{areas}", &join(Area::ALL.iter().map(|a| a.as_str()).collect()))
        .replace("{icons}", &join(Icon::ALL.iter().map(|i| i.as_str()).collect()))
}

/// Build the Messages API request body.
pub fn build_request(config: &UpstreamConfig, image: &ImagePayload) -> Value {
    let mut messages = vec![json!({
        "role": "user",
        "content": [
            {
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.media_type,
                    "data": image.data,
                },
            },
            { "type": "text", "text": tutorial_prompt() },
        ],
    })];
    if config.prefill {
        messages.push(json!({ "role": "assistant", "content": TUTORIAL_PREFILL }));
    }
    let mut body = json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "messages": messages,
    });
    if config.stream {
        body["stream"] = json!(true);
    }
    body
}

pub struct MessagesClient {
    agent: ureq::Agent,
    config: UpstreamConfig,
    api_key: String,
}

impl MessagesClient {
    pub fn new(config: UpstreamConfig, api_key: String) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            config,
            api_key,
        }
    }

    /// Ask the model for a tutorial and return its text, with the prefill
    /// reattached when one was used.
    pub fn generate(&self, image: &ImagePayload) -> Result<ModelOutput, UpstreamError> {
        let body = build_request(&self.config, image);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.config.backoff, attempt);
                tracing::warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying upstream request"
                );
                thread::sleep(delay);
            }
            match self.send_once(&body) {
                Ok(mut output) => {
                    if self.config.prefill {
                        output.text = reattach_prefill(TUTORIAL_PREFILL, &output.text);
                    }
                    return Ok(output);
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(error = %err, attempt, "upstream attempt failed");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| UpstreamError::Transport("no attempt made".to_string())))
    }

    fn send_once(&self, body: &Value) -> Result<ModelOutput, UpstreamError> {
        let start = Instant::now();
        let mut response = self
            .agent
            .post(&self.config.messages_url())
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .send_json(body)
            .map_err(|err| UpstreamError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|err| UpstreamError::Transport(err.to_string()))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status,
            response_bytes = text.len(),
            "upstream call complete"
        );

        if !(200..300).contains(&status) {
            return Err(UpstreamError::Status {
                status,
                message: summarize_error(&text),
            });
        }
        let output = if self.config.stream {
            sse::assemble(&text)?
        } else {
            parse_message(&text)?
        };
        tracing::info!(
            input_tokens = output.input_tokens,
            output_tokens = output.output_tokens,
            text_bytes = output.text.len(),
            "model output received"
        );
        Ok(output)
    }
}

fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
    base.saturating_mul(1 << exponent).min(MAX_BACKOFF)
}

/// Collect the text blocks of a non-streamed Messages API response.
pub fn parse_message(body: &str) -> Result<ModelOutput, UpstreamError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| UpstreamError::Malformed(err.to_string()))?;
    let blocks = value["content"]
        .as_array()
        .ok_or_else(|| UpstreamError::Malformed("response has no content array".to_string()))?;
    let text = blocks
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<String>();
    Ok(ModelOutput {
        text,
        input_tokens: value["usage"]["input_tokens"].as_u64().unwrap_or(0),
        output_tokens: value["usage"]["output_tokens"].as_u64().unwrap_or(0),
    })
}

/// Pull a human-readable message out of an upstream error body.
pub fn summarize_error(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value["error"]["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = value["error"].as_str() {
            return message.to_string();
        }
    }
    let snippet: String = body.trim().chars().take(ERROR_SNIPPET_CHARS).collect();
    if snippet.is_empty() {
        "upstream request failed".to_string()
    } else {
        snippet
    }
}
