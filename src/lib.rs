//! Recovery of draping tutorials from generative model output.
//!
//! Raw text goes through [`Pipeline::run`]: normalization, a tiered decode
//! cascade, schema completion and icon/area diversification. The
//! [`upstream`] and [`reply`] modules hold the plumbing that feeds the
//! pipeline and serializes its results.
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod reply;
pub mod tables;
pub mod upstream;

pub use document::{Area, CanonicalDocument, Icon, LooseDocument, Step};
pub use error::{DecodeError, PipelineError, ValidationError};
pub use extract::{DecodeTier, Extraction, Pipeline};
pub use reply::Reply;
pub use tables::PipelineTables;
