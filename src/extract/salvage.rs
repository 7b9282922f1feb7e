//! Last-resort structural salvage.
//!
//! When no repair produces parseable JSON, step fragments shaped like
//! `{"title": "...", "desc": "..."}` and a handful of top-level scalars are
//! pulled out by pattern. Documents recovered here are lower-confidence and
//! carry no materials or tools.
use crate::document::LooseDocument;
use crate::extract::repair::escape_string_literals;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

// A JSON string body: anything but a quote or backslash, or an escape pair.
const STRING_BODY: &str = r#"((?:[^"\\]|\\.)*?)"#;

static STEP_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?s)\{{\s*"title"\s*:\s*"{STRING_BODY}"\s*,\s*"desc"\s*:\s*"{STRING_BODY}""#
    ))
    .expect("valid step fragment regex")
});

static DIFFICULTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""difficulty"\s*:\s*"?(\d+(?:\.\d+)?)"#).expect("valid difficulty regex")
});

const STRING_FIELDS: [&str; 4] = [
    "designName",
    "designAnalysis",
    "difficultyReason",
    "estimatedTime",
];

static SCALAR_FIELDS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    STRING_FIELDS
        .iter()
        .map(|key| {
            let pattern = format!(r#"(?s)"{key}"\s*:\s*"{STRING_BODY}""#);
            (*key, Regex::new(&pattern).expect("valid scalar field regex"))
        })
        .collect()
});

/// Rebuild a minimal document from fragments, or `None` if no step matched.
pub fn salvage(bounded: &str) -> Option<LooseDocument> {
    let steps: Vec<Value> = STEP_FRAGMENT
        .captures_iter(bounded)
        .map(|caps| {
            json!({
                "title": unescape(&caps[1]),
                "desc": unescape(&caps[2]),
            })
        })
        .collect();
    if steps.is_empty() {
        return None;
    }

    let mut doc = LooseDocument::default();
    for (key, pattern) in SCALAR_FIELDS.iter() {
        if let Some(caps) = pattern.captures(bounded) {
            doc.insert(key, Value::String(unescape(&caps[1])));
        }
    }
    if let Some(caps) = DIFFICULTY.captures(bounded) {
        if let Ok(number) = caps[1].parse::<f64>() {
            doc.insert("difficulty", json!(number));
        }
    }
    doc.insert("materials", json!([]));
    doc.insert("tools", json!([]));
    doc.insert("steps", Value::Array(steps));
    Some(doc)
}

/// Decode JSON escapes in a captured string body, tolerating raw control
/// characters and invalid escapes.
fn unescape(body: &str) -> String {
    let quoted = escape_string_literals(&format!("\"{body}\""));
    serde_json::from_str::<String>(&quoted).unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_steps_and_scalars() {
        let text = r#"{"designName":"Wrap \"Dress\"","difficulty":"4","steps":[
            {"title":"Pin","desc":"Pin the \"front\" panel","icon":"pin"},
            {"title":"Cut","desc":"Cut along the line"} oops ]"#;
        let doc = salvage(text).unwrap();
        assert_eq!(doc.get("designName"), Some(&json!("Wrap \"Dress\"")));
        assert_eq!(doc.get("difficulty"), Some(&json!(4.0)));
        assert_eq!(doc.get("materials"), Some(&json!([])));
        let steps = doc.get("steps").unwrap().as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["desc"], json!("Pin the \"front\" panel"));
        assert_eq!(steps[1]["title"], json!("Cut"));
    }

    #[test]
    fn raw_newlines_in_fragments_are_kept_as_text() {
        let text = "{\"steps\":[{\"title\":\"A\",\"desc\":\"line one\nline two\"}";
        let doc = salvage(text).unwrap();
        assert_eq!(doc.get("steps").unwrap()[0]["desc"], json!("line one\nline two"));
    }

    #[test]
    fn fragments_do_not_run_across_steps() {
        let text = r#"{"title":"A","desc":"one"},{"title":"B","desc":"two"}"#;
        let doc = salvage(text).unwrap();
        let steps = doc.get("steps").unwrap().as_array().unwrap();
        assert_eq!(steps[0]["desc"], json!("one"));
        assert_eq!(steps[1]["desc"], json!("two"));
    }

    #[test]
    fn no_step_fragment_means_no_salvage() {
        assert!(salvage(r#"{"designName":"A", broken"#).is_none());
    }

    #[test]
    fn absent_scalars_stay_absent() {
        let doc = salvage(r#"{"title":"A","desc":"b"}"#).unwrap();
        assert!(doc.get("designName").is_none());
        assert!(doc.get("difficulty").is_none());
    }
}
