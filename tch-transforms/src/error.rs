//! Error taxonomy of the transform engine.
//!
//! Every variant is a configuration or usage error reported synchronously
//! at the point of detection; none is transient or retried. Degenerate
//! numeric inputs (zero-area boxes, empty crops) are valid data, not
//! errors.

use tch_datapoints::StructureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Malformed transform construction arguments.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The sample contains an item kind the transform categorically rejects.
    #[error("unsupported item kind: {0}")]
    UnsupportedItemKind(String),

    /// Flat item count disagrees with the blueprint, or parallel lists
    /// have unequal lengths.
    #[error("structure mismatch: {0}")]
    StructureMismatch(String),

    /// No labels getter is configured and none can be inferred.
    #[error("ambiguous labels: {0}")]
    AmbiguousLabels(String),

    /// The resolver requires a spatially described candidate and found none.
    #[error("no spatial reference: {0}")]
    NoSpatialReference(String),
}

impl TransformError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unsupported_item_kind(msg: impl Into<String>) -> Self {
        Self::UnsupportedItemKind(msg.into())
    }

    pub fn structure_mismatch(msg: impl Into<String>) -> Self {
        Self::StructureMismatch(msg.into())
    }

    pub fn ambiguous_labels(msg: impl Into<String>) -> Self {
        Self::AmbiguousLabels(msg.into())
    }

    pub fn no_spatial_reference(msg: impl Into<String>) -> Self {
        Self::NoSpatialReference(msg.into())
    }
}

impl From<StructureError> for TransformError {
    fn from(from: StructureError) -> Self {
        Self::StructureMismatch(from.to_string())
    }
}

pub type Result<T, E = TransformError> = std::result::Result<T, E>;

/// Bail out with `InvalidConfiguration` when a construction check fails.
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::TransformError::InvalidConfiguration(
                format!($($arg)*),
            ));
        }
    };
}
pub(crate) use ensure_config;
