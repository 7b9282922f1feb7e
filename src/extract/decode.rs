//! Tiered decoding of model output into a loose JSON object.
//!
//! Tiers run cheapest-first and stop at the first parse. Well-formed output
//! exits at [`DecodeTier::Direct`] untouched; each later tier targets one
//! class of defect, ending with pattern salvage.
use crate::document::LooseDocument;
use crate::error::DecodeError;
use crate::extract::normalize::normalize;
use crate::extract::repair::{
    ascii_punctuation, escape_string_literals, strip_control_chars, strip_trailing_separators,
};
use crate::extract::salvage::salvage;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeTier {
    /// Normalized text parsed verbatim.
    Direct,
    /// Parsed after slicing to the outermost braces.
    Bounded,
    /// Control characters and trailing commas removed.
    BasicCleanup,
    /// Raw newlines/tabs in strings escaped, stray backslashes dropped.
    StringRepair,
    /// Full-width quotes, commas, and colons mapped to ASCII.
    Punctuation,
    /// Steps and scalars recovered by pattern match.
    Salvage,
}

impl DecodeTier {
    /// Order in which the cascade tries tiers.
    pub const CASCADE: [DecodeTier; 6] = [
        DecodeTier::Direct,
        DecodeTier::Bounded,
        DecodeTier::BasicCleanup,
        DecodeTier::StringRepair,
        DecodeTier::Punctuation,
        DecodeTier::Salvage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DecodeTier::Direct => "direct",
            DecodeTier::Bounded => "bounded",
            DecodeTier::BasicCleanup => "basic_cleanup",
            DecodeTier::StringRepair => "string_repair",
            DecodeTier::Punctuation => "punctuation",
            DecodeTier::Salvage => "salvage",
        }
    }

    fn attempt(self, work: &mut WorkText) -> TierOutcome {
        match self {
            DecodeTier::Direct => parse_object(&work.normalized).into(),
            DecodeTier::Bounded => match bounded_slice(&work.normalized) {
                Some(slice) => {
                    let outcome: TierOutcome = parse_object(slice).into();
                    work.bounded = slice.to_string();
                    outcome
                }
                None => TierOutcome::Fail(DecodeError::NoJsonObjectFound),
            },
            DecodeTier::BasicCleanup => {
                work.cleaned = strip_trailing_separators(&strip_control_chars(&work.bounded));
                parse_object(&work.cleaned).into()
            }
            DecodeTier::StringRepair => {
                work.repaired = escape_string_literals(&work.cleaned);
                parse_object(&work.repaired).into()
            }
            DecodeTier::Punctuation => {
                // Strings opened by mapped quotes were invisible to the
                // previous scan, so escape again after mapping.
                let mapped = escape_string_literals(&ascii_punctuation(&work.repaired));
                parse_object(&strip_trailing_separators(&mapped)).into()
            }
            DecodeTier::Salvage => match salvage(&work.bounded) {
                Some(doc) => TierOutcome::Parsed(doc),
                None => TierOutcome::Fail(DecodeError::UnrecoverableContent),
            },
        }
    }
}

impl fmt::Display for DecodeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single tier.
#[derive(Debug)]
enum TierOutcome {
    Parsed(LooseDocument),
    /// The tier did not apply; try the next one.
    Continue,
    /// No later tier can help.
    Fail(DecodeError),
}

impl From<Option<LooseDocument>> for TierOutcome {
    fn from(parsed: Option<LooseDocument>) -> Self {
        parsed.map_or(TierOutcome::Continue, TierOutcome::Parsed)
    }
}

/// Intermediate texts shared between tiers.
#[derive(Debug, Default)]
struct WorkText {
    normalized: String,
    bounded: String,
    cleaned: String,
    repaired: String,
}

/// A decoded object and the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub document: LooseDocument,
    pub tier: DecodeTier,
}

/// Run the cascade over raw model output.
pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let mut work = WorkText {
        normalized: normalize(raw),
        ..WorkText::default()
    };
    if work.normalized.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    for tier in DecodeTier::CASCADE {
        match tier.attempt(&mut work) {
            TierOutcome::Parsed(document) => {
                if tier == DecodeTier::Salvage {
                    tracing::warn!(tier = %tier, "decoded by structural salvage");
                } else {
                    tracing::debug!(tier = %tier, "decoded");
                }
                return Ok(Decoded { document, tier });
            }
            TierOutcome::Continue => {
                tracing::debug!(tier = %tier, "tier did not parse; continuing");
            }
            TierOutcome::Fail(err) => {
                tracing::debug!(tier = %tier, error = %err, "cascade stopped");
                return Err(err);
            }
        }
    }
    Err(DecodeError::UnrecoverableContent)
}

/// Slice from the first `{` to the last `}` inclusive.
fn bounded_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_object(text: &str) -> Option<LooseDocument> {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(LooseDocument::from_value)
}
