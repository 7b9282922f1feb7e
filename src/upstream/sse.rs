//! Reassembly of a streamed Messages API response.
//!
//! The body is a sequence of server-sent events. Text deltas are
//! concatenated; usage counters are picked from the start and delta events.
//! Lines that are not `data:` events or fail to parse are ignored.
use super::{ModelOutput, UpstreamError};
use serde_json::Value;

pub fn assemble(body: &str) -> Result<ModelOutput, UpstreamError> {
    let mut output = ModelOutput::default();
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        let Ok(event) = serde_json::from_str::<Value>(data) else {
            continue;
        };
        match event.get("type").and_then(Value::as_str) {
            Some("content_block_delta") => {
                let delta = &event["delta"];
                if delta.get("type").and_then(Value::as_str) == Some("text_delta") {
                    if let Some(text) = delta.get("text").and_then(Value::as_str) {
                        output.text.push_str(text);
                    }
                }
            }
            Some("message_start") => {
                if let Some(tokens) = event["message"]["usage"]["input_tokens"].as_u64() {
                    output.input_tokens = tokens;
                }
            }
            Some("message_delta") => {
                if let Some(tokens) = event["usage"]["output_tokens"].as_u64() {
                    output.output_tokens = tokens;
                }
            }
            Some("error") => {
                let message = event["error"]["message"]
                    .as_str()
                    .unwrap_or("stream reported an error")
                    .to_string();
                return Err(UpstreamError::Stream(message));
            }
            _ => {}
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_text_deltas_and_usage() {
        let body = "event: message_start\n\
data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":1200}}}\n\
\n\
event: content_block_delta\n\
data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"{\\\"designName\\\"\"}}\n\
\n\
data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\":\\\"A\\\"}\"}}\n\
data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"x\"}}\n\
data: {\"type\":\"message_delta\",\"usage\":{\"output_tokens\":37}}\n\
data: [DONE]\n";
        let output = assemble(body).unwrap();
        assert_eq!(output.text, "{\"designName\":\"A\"}");
        assert_eq!(output.input_tokens, 1200);
        assert_eq!(output.output_tokens, 37);
    }

    #[test]
    fn ignores_garbage_lines() {
        let body = "data: not json\r\n: keep-alive\r\ndata: {\"type\":\"ping\"}\r\n\
data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"ok\"}}\r\n";
        assert_eq!(assemble(body).unwrap().text, "ok");
    }

    #[test]
    fn error_event_is_reported() {
        let body = "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n";
        let err = assemble(body).unwrap_err();
        assert!(matches!(err, UpstreamError::Stream(message) if message == "Overloaded"));
    }
}
