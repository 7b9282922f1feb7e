//! Presentation stripping for raw model output.
use regex::Regex;
use std::sync::LazyLock;

const BYTE_ORDER_MARK: char = '\u{feff}';

// An opening fence may carry a language tag ("```json", "```JSON5").
static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^```[a-z0-9_+-]*[ \t]*(?:\r?\n)?").expect("valid opening fence regex")
});
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n)?[ \t]*```$").expect("valid closing fence regex"));

/// Strip a byte-order mark, surrounding whitespace, and one pair of code
/// fences. Never fails; returns an empty string for blank input.
pub fn normalize(raw: &str) -> String {
    let text = raw.trim().trim_start_matches(BYTE_ORDER_MARK).trim();
    let text = OPENING_FENCE.replace(text, "");
    let text = CLOSING_FENCE.replace(&text, "");
    text.trim().to_string()
}
