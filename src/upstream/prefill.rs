//! Prefill reattachment.
//!
//! When the request seeds the assistant turn with the opening of the
//! object, the model's continuation lacks that opening. Some models restate
//! the whole object anyway, so the prefix is only attached when missing.
use crate::extract::normalize::normalize;

/// Seed for the assistant turn: the opening of the tutorial object.
pub const TUTORIAL_PREFILL: &str = "{\"designName\":\"";

/// Join `prefix` and the model's `continuation` without doubling it.
pub fn reattach_prefill(prefix: &str, continuation: &str) -> String {
    let restated = normalize(continuation);
    if restated.starts_with('{') {
        return continuation.to_string();
    }
    if let Some(key) = first_key(prefix) {
        if restated.starts_with(key) {
            return format!("{{{restated}");
        }
    }
    format!("{prefix}{continuation}")
}

/// The quoted first key of a prefix like `{"designName":"`.
fn first_key(prefix: &str) -> Option<&str> {
    let rest = prefix.trim_start().strip_prefix('{')?;
    let key = rest.split(':').next()?.trim();
    (key.len() > 2 && key.starts_with('"') && key.ends_with('"')).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_gets_prefix() {
        assert_eq!(
            reattach_prefill(TUTORIAL_PREFILL, "A\",\"steps\":[]}"),
            "{\"designName\":\"A\",\"steps\":[]}"
        );
    }

    #[test]
    fn restated_object_is_not_prefixed() {
        let full = "{\"designName\":\"A\"}";
        assert_eq!(reattach_prefill(TUTORIAL_PREFILL, full), full);
        let fenced = "```json\n{\"designName\":\"A\"}\n```";
        assert_eq!(reattach_prefill(TUTORIAL_PREFILL, fenced), fenced);
    }

    #[test]
    fn restated_first_field_gets_only_brace() {
        assert_eq!(
            reattach_prefill(TUTORIAL_PREFILL, " \"designName\":\"A\"}"),
            "{\"designName\":\"A\"}"
        );
    }

    #[test]
    fn first_key_is_extracted() {
        assert_eq!(first_key(TUTORIAL_PREFILL), Some("\"designName\""));
        assert_eq!(first_key("{"), None);
        assert_eq!(first_key("plain"), None);
    }
}
