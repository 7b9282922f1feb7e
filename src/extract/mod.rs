//! Extraction pipeline: normalize, decode, validate, classify.
//!
//! The pipeline is synchronous and holds only immutable tables, so a single
//! [`Pipeline`] can be shared freely across threads.
pub mod classify;
pub mod decode;
pub mod normalize;
pub mod repair;
pub mod salvage;
pub mod validate;

use crate::document::CanonicalDocument;
use crate::error::PipelineError;
use crate::tables::PipelineTables;
use serde::Serialize;

pub use decode::{decode, DecodeTier, Decoded};

/// A canonical document and how it was recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub tier: DecodeTier,
    pub salvaged: bool,
    pub document: CanonicalDocument,
}

impl Extraction {
    /// True when structural salvage produced the document; such documents
    /// deserve more conservative handling downstream.
    pub fn is_salvaged(&self) -> bool {
        self.salvaged
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    tables: PipelineTables,
}

impl Pipeline {
    pub fn new(tables: PipelineTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &PipelineTables {
        &self.tables
    }

    /// Recover a canonical tutorial from raw model output.
    pub fn run(&self, raw: &str) -> Result<Extraction, PipelineError> {
        let Decoded { document, tier } = decode(raw)?;
        let canonical = validate::validate(&document, &self.tables)?;
        let document = classify::diversify(canonical, &self.tables);
        tracing::info!(
            tier = %tier,
            steps = document.steps.len(),
            "extracted tutorial"
        );
        Ok(Extraction {
            tier,
            salvaged: tier == DecodeTier::Salvage,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ValidationError};

    #[test]
    fn missing_steps_reported_separately_from_decode_failure() {
        let pipeline = Pipeline::default();
        let err = pipeline.run(r#"{"designName":"A","steps":[]}"#).unwrap_err();
        assert_eq!(err, PipelineError::Validation(ValidationError::MissingSteps));
        let err = pipeline.run("no object here").unwrap_err();
        assert_eq!(err, PipelineError::Decode(DecodeError::NoJsonObjectFound));
    }

    #[test]
    fn salvaged_documents_are_flagged() {
        let pipeline = Pipeline::default();
        let raw = r#"{"steps":[{"title":"Pin","desc":"pin it"} ,, ]"#;
        let extraction = pipeline.run(raw).unwrap();
        assert!(extraction.is_salvaged());
        assert_eq!(extraction.tier, DecodeTier::Salvage);
        assert_eq!(extraction.document.steps[0].title, "Pin");
    }

    #[test]
    fn clean_documents_are_not_flagged() {
        let pipeline = Pipeline::default();
        let extraction = pipeline.run(r#"{"steps":[{"title":"Pin"}]}"#).unwrap();
        assert!(!extraction.is_salvaged());
        assert_eq!(extraction.tier, DecodeTier::Direct);
    }
}
