//! Error types for bathyzone

use std::fmt;
use thiserror::Error;

/// Main error type for bathyzone operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    /// Inputs are in different coordinate reference systems.
    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    /// Inputs do not share any spatial extent.
    #[error("Extents do not overlap: {0}")]
    NoOverlap(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Feature {index} has no usable `{field}` attribute")]
    MissingAttribute { field: String, index: usize },

    /// A result table broke one of its numeric invariants and must not be persisted.
    #[error("Validation failed for `{label}`: {}", FailureList(.failures))]
    ValidationFailed {
        label: String,
        failures: Vec<ValidationFailure>,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error comes from misaligned inputs (CRS or extent)
    pub fn is_alignment(&self) -> bool {
        matches!(self, Error::CrsMismatch(..) | Error::NoOverlap(_))
    }
}

/// One region that failed the output validation gate
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub region_id: u64,
    pub reason: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}: {}", self.region_id, self.reason)
    }
}

struct FailureList<'a>(&'a [ValidationFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Result type alias for bathyzone operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_regions() {
        let err = Error::ValidationFailed {
            label: "legacy".into(),
            failures: vec![
                ValidationFailure { region_id: 7, reason: "fraction 1.2 > 1".into() },
                ValidationFailure { region_id: 9, reason: "stratum 2 protected > total".into() },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("legacy"));
        assert!(msg.contains("region 7"));
        assert!(msg.contains("region 9"));
    }

    #[test]
    fn test_alignment_classification() {
        assert!(Error::CrsMismatch("EPSG:4326".into(), "EPSG:3338".into()).is_alignment());
        assert!(Error::NoOverlap("fine vs coarse".into()).is_alignment());
        assert!(!Error::Other("x".into()).is_alignment());
    }
}
