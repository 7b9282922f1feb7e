//! Schema validation and completion.
//!
//! Turns a [`LooseDocument`] into a [`CanonicalDocument`]. Missing or
//! mistyped fields are filled with defaults; the only rejection is a
//! document without a usable `steps` array.
use crate::document::{
    Area, CanonicalDocument, Icon, LooseDocument, Material, Step, Tool, Trouble,
};
use crate::error::ValidationError;
use crate::tables::PipelineTables;
use serde_json::{Map, Value};

pub const MAX_DESIGN_NAME_CHARS: usize = 30;
pub const TRUNCATED_DESIGN_NAME_CHARS: usize = 20;
pub const DEFAULT_DIFFICULTY: u8 = 3;

const SENTENCE_TERMINALS: [char; 8] = ['.', ',', '!', '?', '。', '，', '！', '？'];

/// Validate and complete a decoded document.
pub fn validate(
    doc: &LooseDocument,
    tables: &PipelineTables,
) -> Result<CanonicalDocument, ValidationError> {
    let steps = match doc.get("steps") {
        Some(Value::Array(entries)) if !entries.is_empty() => entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| step_from(entry, idx, tables))
            .collect::<Vec<_>>(),
        _ => return Err(ValidationError::MissingSteps),
    };

    Ok(CanonicalDocument {
        design_name: design_name(doc.get("designName"), tables),
        design_analysis: text_field(doc.get("designAnalysis")),
        difficulty: difficulty(doc.get("difficulty")),
        difficulty_reason: text_field(doc.get("difficultyReason")),
        estimated_time: text_field(doc.get("estimatedTime")),
        materials: materials(doc.get("materials"), tables),
        tools: tools(doc.get("tools"), tables),
        steps,
    })
}

/// Coerce a scalar to text. Strings are trimmed; numbers and booleans are
/// rendered; anything else is treated as absent.
fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn text_field(value: Option<&Value>) -> String {
    coerce_text(value).unwrap_or_default()
}

fn text_or(value: Option<&Value>, placeholder: &str) -> String {
    coerce_text(value)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn design_name(value: Option<&Value>, tables: &PipelineTables) -> String {
    let Some(name) = coerce_text(value).filter(|name| !name.is_empty()) else {
        return tables.default_design_name.clone();
    };
    let lowered = name.to_lowercase();
    if tables
        .conversational_markers
        .iter()
        .any(|marker| marker.is_in(&lowered))
    {
        return tables.generic_design_name.clone();
    }
    if name.chars().count() <= MAX_DESIGN_NAME_CHARS {
        return name;
    }
    let head: String = name
        .chars()
        .take_while(|ch| !SENTENCE_TERMINALS.contains(ch))
        .take(TRUNCATED_DESIGN_NAME_CHARS)
        .collect();
    let head = head.trim();
    if head.is_empty() {
        tables.default_design_name.clone()
    } else {
        head.to_string()
    }
}

fn difficulty(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(level) if level.is_finite() && (1.0..=5.0).contains(&level) => level.round() as u8,
        _ => DEFAULT_DIFFICULTY,
    }
}

fn materials(value: Option<&Value>, tables: &PipelineTables) -> Vec<Material> {
    let entries: Vec<Material> = array(value)
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => Some(Material {
                item: text_or(fields.get("item"), "材料"),
                spec: text_field(fields.get("spec")),
                qty: text_field(fields.get("qty")),
            }),
            Value::String(item) if !item.trim().is_empty() => Some(Material {
                item: item.trim().to_string(),
                spec: String::new(),
                qty: String::new(),
            }),
            _ => None,
        })
        .collect();
    if entries.is_empty() {
        tables.default_materials.clone()
    } else {
        entries
    }
}

fn tools(value: Option<&Value>, tables: &PipelineTables) -> Vec<Tool> {
    let entries: Vec<Tool> = array(value)
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => Some(Tool {
                name: text_or(fields.get("name"), "工具"),
                purpose: text_field(fields.get("purpose")),
            }),
            Value::String(name) if !name.trim().is_empty() => Some(Tool {
                name: name.trim().to_string(),
                purpose: String::new(),
            }),
            _ => None,
        })
        .collect();
    if entries.is_empty() {
        tables.default_tools.clone()
    } else {
        entries
    }
}

fn step_from(entry: &Value, idx: usize, tables: &PipelineTables) -> Step {
    let empty = Map::new();
    let (fields, bare_text) = match entry {
        Value::Object(fields) => (fields, None),
        Value::String(text) => (&empty, Some(text.trim().to_string())),
        _ => (&empty, None),
    };
    let title_placeholder = format!("步骤 {}", idx + 1);
    Step {
        title: text_or(fields.get("title"), &title_placeholder),
        desc: bare_text.unwrap_or_else(|| text_field(fields.get("desc"))),
        technique: text_field(fields.get("technique")),
        icon: coerce_text(fields.get("icon"))
            .and_then(|raw| raw.parse::<Icon>().ok())
            .unwrap_or(tables.default_icon),
        area: coerce_text(fields.get("area"))
            .and_then(|raw| raw.parse::<Area>().ok())
            .unwrap_or(tables.default_area),
        tips: text_field(fields.get("tips")),
        troubles: array(fields.get("troubles"))
            .iter()
            .filter_map(|trouble| match trouble {
                Value::Object(pair) => Some(Trouble {
                    q: text_field(pair.get("q")),
                    a: text_field(pair.get("a")),
                }),
                _ => None,
            })
            .collect(),
    }
}

fn array(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(entries)) => entries,
        _ => &[],
    }
}
