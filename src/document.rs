//! Document types for tutorial extraction.
//!
//! A [`LooseDocument`] is whatever a decoder tier managed to parse: an
//! untyped JSON object with no guarantees. A [`CanonicalDocument`] is the
//! only value that leaves the pipeline and always satisfies the schema.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Untyped object produced by a successful decoder tier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LooseDocument(Map<String, Value>);

impl LooseDocument {
    /// Wrap a parsed value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Tool glyph shown next to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Pin,
    Scissors,
    Pencil,
    Ruler,
    Hand,
    Fold,
    Iron,
    Measure,
    Drape,
    Wrap,
    Pleat,
    Gather,
    Tuck,
    Dart,
    Trim,
    Baste,
}

impl Icon {
    pub const ALL: [Icon; 16] = [
        Icon::Pin,
        Icon::Scissors,
        Icon::Pencil,
        Icon::Ruler,
        Icon::Hand,
        Icon::Fold,
        Icon::Iron,
        Icon::Measure,
        Icon::Drape,
        Icon::Wrap,
        Icon::Pleat,
        Icon::Gather,
        Icon::Tuck,
        Icon::Dart,
        Icon::Trim,
        Icon::Baste,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Icon::Pin => "pin",
            Icon::Scissors => "scissors",
            Icon::Pencil => "pencil",
            Icon::Ruler => "ruler",
            Icon::Hand => "hand",
            Icon::Fold => "fold",
            Icon::Iron => "iron",
            Icon::Measure => "measure",
            Icon::Drape => "drape",
            Icon::Wrap => "wrap",
            Icon::Pleat => "pleat",
            Icon::Gather => "gather",
            Icon::Tuck => "tuck",
            Icon::Dart => "dart",
            Icon::Trim => "trim",
            Icon::Baste => "baste",
        }
    }
}

/// Body region a step works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Neck,
    Shoulder,
    Chest,
    Waist,
    Hip,
    Hem,
    Side,
    Back,
    Full,
}

impl Area {
    pub const ALL: [Area; 9] = [
        Area::Neck,
        Area::Shoulder,
        Area::Chest,
        Area::Waist,
        Area::Hip,
        Area::Hem,
        Area::Side,
        Area::Back,
        Area::Full,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Area::Neck => "neck",
            Area::Shoulder => "shoulder",
            Area::Chest => "chest",
            Area::Waist => "waist",
            Area::Hip => "hip",
            Area::Hem => "hem",
            Area::Side => "side",
            Area::Back => "back",
            Area::Full => "full",
        }
    }
}

/// Error for a value outside a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

// Matching is case-insensitive and ignores surrounding whitespace; models
// regularly emit "Pin" or " chest".
impl FromStr for Icon {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        Icon::ALL
            .into_iter()
            .find(|icon| icon.as_str() == needle)
            .ok_or_else(|| UnknownVariant(raw.to_string()))
    }
}

impl FromStr for Area {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        Area::ALL
            .into_iter()
            .find(|area| area.as_str() == needle)
            .ok_or_else(|| UnknownVariant(raw.to_string()))
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A material entry in the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub item: String,
    pub spec: String,
    pub qty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub purpose: String,
}

/// A likely problem and its fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trouble {
    pub q: String,
    pub a: String,
}

/// One tutorial step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub desc: String,
    pub technique: String,
    pub icon: Icon,
    pub area: Area,
    pub tips: String,
    pub troubles: Vec<Trouble>,
}

impl Step {
    /// Text the classifier inspects for keyword cues.
    pub fn cue_text(&self) -> String {
        format!("{} {}", self.title, self.desc).to_lowercase()
    }
}

/// Schema-conformant tutorial document.
///
/// Every collection is present, `steps` is never empty, `difficulty` is in
/// `1..=5`, and enum fields are members of their closed sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDocument {
    pub design_name: String,
    pub design_analysis: String,
    pub difficulty: u8,
    pub difficulty_reason: String,
    pub estimated_time: String,
    pub materials: Vec<Material>,
    pub tools: Vec<Tool>,
    pub steps: Vec<Step>,
}

impl CanonicalDocument {
    /// Convert back into an untyped object, e.g. to feed it through validation again.
    pub fn to_loose(&self) -> LooseDocument {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => LooseDocument(fields),
            _ => LooseDocument::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn icon_parse_is_case_insensitive() {
        assert_eq!(" Scissors ".parse::<Icon>(), Ok(Icon::Scissors));
        assert_eq!("BASTE".parse::<Icon>(), Ok(Icon::Baste));
        assert!("needle".parse::<Icon>().is_err());
    }

    #[test]
    fn area_parse_rejects_unknown() {
        assert_eq!("hem".parse::<Area>(), Ok(Area::Hem));
        assert_eq!("sleeve".parse::<Area>(), Err(UnknownVariant("sleeve".to_string())));
    }

    #[test]
    fn enum_serde_matches_as_str() {
        for icon in Icon::ALL {
            assert_eq!(serde_json::to_value(icon).unwrap(), json!(icon.as_str()));
        }
        for area in Area::ALL {
            assert_eq!(serde_json::to_value(area).unwrap(), json!(area.as_str()));
        }
    }

    #[test]
    fn loose_document_rejects_non_objects() {
        assert!(LooseDocument::from_value(json!([1, 2])).is_none());
        assert!(LooseDocument::from_value(json!("text")).is_none());
        let doc = LooseDocument::from_value(json!({"a": 1})).unwrap();
        assert_eq!(doc.get("a"), Some(&json!(1)));
    }

    #[test]
    fn canonical_serializes_camel_case() {
        let doc = CanonicalDocument {
            design_name: "A".to_string(),
            design_analysis: String::new(),
            difficulty: 3,
            difficulty_reason: String::new(),
            estimated_time: String::new(),
            materials: Vec::new(),
            tools: Vec::new(),
            steps: vec![Step {
                title: "t".to_string(),
                desc: "d".to_string(),
                technique: String::new(),
                icon: Icon::Pin,
                area: Area::Full,
                tips: String::new(),
                troubles: Vec::new(),
            }],
        };
        let loose = doc.to_loose();
        assert_eq!(loose.get("designName"), Some(&json!("A")));
        assert_eq!(loose.get("estimatedTime"), Some(&json!("")));
        assert_eq!(loose.get("steps").unwrap()[0]["icon"], json!("pin"));
    }
}
