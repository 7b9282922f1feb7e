//! Textual repairs applied by the decoder tiers.
//!
//! Each function is pure and targets one class of defect. The escape-aware
//! scanner is the only one that needs to know where strings begin and end.
use regex::Regex;
use std::sync::LazyLock;

static TRAILING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing separator regex"));

/// Drop control characters other than newline, carriage return, and tab.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_control() || matches!(ch, '\n' | '\r' | '\t'))
        .collect()
}

/// Remove commas that directly precede a closing bracket or brace.
pub fn strip_trailing_separators(text: &str) -> String {
    TRAILING_SEPARATOR.replace_all(text, "$1").into_owned()
}

/// Scanner position relative to JSON string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InString,
    EscapePending,
}

/// Escape raw line breaks and tabs inside string literals and drop stray
/// backslashes outside them.
///
/// A `\r\n` pair inside a string becomes a single `\n` escape.
pub fn escape_string_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut state = ScanState::Outside;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match (state, ch) {
            (ScanState::Outside, '"') => {
                out.push(ch);
                ScanState::InString
            }
            (ScanState::Outside, '\\') => ScanState::Outside,
            (ScanState::Outside, _) => {
                out.push(ch);
                ScanState::Outside
            }
            (ScanState::InString, '"') => {
                out.push(ch);
                ScanState::Outside
            }
            (ScanState::InString, '\\') => {
                out.push(ch);
                ScanState::EscapePending
            }
            (ScanState::InString, '\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
                ScanState::InString
            }
            (ScanState::InString, '\n') => {
                out.push_str("\\n");
                ScanState::InString
            }
            (ScanState::InString, '\t') => {
                out.push_str("\\t");
                ScanState::InString
            }
            (ScanState::InString, _) => {
                out.push(ch);
                ScanState::InString
            }
            // The escaped character is copied as-is, except raw whitespace
            // which would still be illegal after the backslash.
            (ScanState::EscapePending, '\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('n');
                ScanState::InString
            }
            (ScanState::EscapePending, '\n') => {
                out.push('n');
                ScanState::InString
            }
            (ScanState::EscapePending, '\t') => {
                out.push('t');
                ScanState::InString
            }
            (ScanState::EscapePending, _) => {
                out.push(ch);
                ScanState::InString
            }
        };
    }
    out
}

/// Map full-width quotation marks, commas, and colons to ASCII.
pub fn ascii_punctuation(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{201c}' | '\u{201d}' | '\u{ff02}' => '"',
            '\u{ff0c}' => ',',
            '\u{ff1a}' => ':',
            other => other,
        })
        .collect()
}
