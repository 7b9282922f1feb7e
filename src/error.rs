//! Typed failures for the extraction pipeline.
//!
//! Individual tier misses never surface here; only exhaustion of the whole
//! cascade, or a document without steps, reaches the caller.
use thiserror::Error;

/// Decoding failed before any object could be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("model output is empty")]
    EmptyInput,
    #[error("model output contains no JSON object")]
    NoJsonObjectFound,
    #[error("model output could not be parsed or salvaged")]
    UnrecoverableContent,
}

/// A decoded object failed the schema gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("decoded document has no steps")]
    MissingSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    /// Stable snake_case identifier for serialized replies.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Decode(DecodeError::EmptyInput) => "empty_input",
            PipelineError::Decode(DecodeError::NoJsonObjectFound) => "no_json_object_found",
            PipelineError::Decode(DecodeError::UnrecoverableContent) => "unrecoverable_content",
            PipelineError::Validation(ValidationError::MissingSteps) => "missing_steps",
        }
    }

    /// True when the failure reflects a bad generation that re-querying the
    /// model can fix. Empty output points at the transport instead.
    pub fn should_retry(&self) -> bool {
        !matches!(self, PipelineError::Decode(DecodeError::EmptyInput))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            PipelineError::from(DecodeError::EmptyInput),
            PipelineError::from(DecodeError::NoJsonObjectFound),
            PipelineError::from(DecodeError::UnrecoverableContent),
            PipelineError::from(ValidationError::MissingSteps),
        ];
        let codes: std::collections::BTreeSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn empty_input_is_not_a_bad_generation() {
        assert!(!PipelineError::from(DecodeError::EmptyInput).should_retry());
        assert!(PipelineError::from(DecodeError::NoJsonObjectFound).should_retry());
        assert!(PipelineError::from(ValidationError::MissingSteps).should_retry());
    }

    #[test]
    fn display_is_transparent() {
        let err = PipelineError::from(ValidationError::MissingSteps);
        assert_eq!(err.to_string(), "decoded document has no steps");
    }
}
