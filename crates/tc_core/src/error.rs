//! Crate-wide error taxonomy.
//!
//! Structural problems (missing data, shape mismatches, absent archives) and
//! provenance violations are fatal and surface immediately. Empty results
//! (no candidates, no tracks, no matches) are ordinary values, not errors.

use thiserror::Error;

use crate::cache::StoreError;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("field '{field}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("coordinate axis '{axis}' has {len} points, need at least {min}")]
    AxisTooShort {
        axis: &'static str,
        len: usize,
        min: usize,
    },

    #[error("cannot take a percentile of an empty sample")]
    EmptySample,

    #[error("best-track archive not found: {path}")]
    ArchiveNotFound { path: String },

    #[error("malformed best-track archive: {reason}")]
    ArchiveFormat { reason: String },

    #[error("forecast model '{found}' does not match the canonical id '{expected}'")]
    ModelProvenance { found: String, expected: String },

    #[error("invalid calibration parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("feature store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

impl ValidationError {
    /// Stable machine-readable code for the JSON API envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::ShapeMismatch { .. } => "shape_mismatch",
            ValidationError::AxisTooShort { .. } => "axis_too_short",
            ValidationError::EmptySample => "empty_sample",
            ValidationError::ArchiveNotFound { .. } => "archive_not_found",
            ValidationError::ArchiveFormat { .. } => "archive_format",
            ValidationError::ModelProvenance { .. } => "model_provenance",
            ValidationError::InvalidParams { .. } => "invalid_params",
            ValidationError::Store(_) => "store",
            ValidationError::Json(_) => "json",
            ValidationError::Yaml(_) => "yaml",
            ValidationError::Io(_) => "io",
        }
    }
}
