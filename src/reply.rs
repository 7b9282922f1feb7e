//! HTTP-shaped replies for extraction results.
//!
//! A reply is a status, a header map and a JSON body. Nothing here speaks
//! HTTP; a server front end only has to copy the three parts out.
use crate::error::PipelineError;
use crate::extract::Extraction;
use crate::upstream::UpstreamError;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_BAD_GATEWAY: u16 = 502;
pub const STATUS_INTERNAL: u16 = 500;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl Reply {
    fn new(status: u16, body: Value) -> Self {
        let mut headers: BTreeMap<String, String> = CORS_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body,
        }
    }

    /// The canonical document, with recovery details in headers.
    pub fn success(extraction: &Extraction) -> Self {
        let body = serde_json::to_value(&extraction.document).unwrap_or(Value::Null);
        let mut reply = Self::new(STATUS_OK, body);
        reply
            .headers
            .insert("X-Decode-Tier".to_string(), extraction.tier.to_string());
        reply.headers.insert(
            "X-Salvaged".to_string(),
            extraction.is_salvaged().to_string(),
        );
        reply
    }

    pub fn pipeline_failure(err: &PipelineError) -> Self {
        Self::new(
            STATUS_UNPROCESSABLE,
            json!({
                "error": err.to_string(),
                "code": err.code(),
                "retry": err.should_retry(),
            }),
        )
    }

    /// Upstream error statuses pass through; transport and stream failures
    /// become a bad gateway.
    pub fn upstream_failure(err: &UpstreamError) -> Self {
        let status = match err {
            UpstreamError::Status { status, .. } if *status >= 400 => *status,
            _ => STATUS_BAD_GATEWAY,
        };
        Self::new(status, json!({ "error": err.to_string() }))
    }

    pub fn missing_credential() -> Self {
        Self::new(
            STATUS_INTERNAL,
            json!({ "error": "ANTHROPIC_API_KEY is not configured" }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
