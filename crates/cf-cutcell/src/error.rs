//! Error types for cut-cell construction and queries.

use thiserror::Error;

/// Result type alias for cut-cell operations.
pub type CellResult<T> = Result<T, CellError>;

/// Errors that can occur while building or querying a cut cell.
///
/// Numerical degeneracies of the boundary fit are never reported here; the
/// fitter resolves them with a fixed fallback plane.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CellError {
    /// The number of corner samples does not match `2^dim`.
    #[error("expected {expected} corner samples, got {actual}")]
    CornerCountMismatch {
        /// Number of corners of the cell.
        expected: usize,
        /// Number of samples supplied.
        actual: usize,
    },

    /// A corner sample is NaN or infinite.
    #[error("corner sample {index} is not finite: {value}")]
    NonFiniteSample {
        /// Corner index of the offending sample.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// The number of sub-cells per axis must be at least one.
    #[error("edge sample count must be positive, got {0}")]
    InvalidSampleCount(usize),

    /// A corner index passed to a per-corner accessor is out of range.
    #[error("corner index {index} is out of range for a cell with {count} corners")]
    CornerOutOfRange {
        /// The requested corner index.
        index: usize,
        /// Number of corners of the cell.
        count: usize,
    },

    /// A sub-cell index is out of range.
    #[error("sample index {index} is out of range for {count} samples")]
    SampleOutOfRange {
        /// The requested flat sample index.
        index: usize,
        /// Number of sub-cells.
        count: usize,
    },

    /// A velocity vector does not have one entry per corner and axis.
    #[error("expected {expected} velocity components, got {actual}")]
    VelocityLengthMismatch {
        /// `dim · 2^dim`.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// Material parameters are not physically valid.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// The classification threshold must be finite and lie in `[0, 0.5)`.
    #[error("classification threshold must lie in [0, 0.5), got {0}")]
    InvalidThreshold(f64),

    /// Only two- and three-dimensional cells are supported.
    #[error("unsupported cell dimension {0}, expected 2 or 3")]
    UnsupportedDimension(usize),
}

impl CellError {
    /// Create a corner count mismatch error.
    #[must_use]
    pub const fn corner_count(expected: usize, actual: usize) -> Self {
        Self::CornerCountMismatch { expected, actual }
    }

    /// Create a corner out of range error.
    #[must_use]
    pub const fn corner_out_of_range(index: usize, count: usize) -> Self {
        Self::CornerOutOfRange { index, count }
    }

    /// Create a sample out of range error.
    #[must_use]
    pub const fn sample_out_of_range(index: usize, count: usize) -> Self {
        Self::SampleOutOfRange { index, count }
    }

    /// Create an invalid material error.
    #[must_use]
    pub fn invalid_material(details: impl Into<String>) -> Self {
        Self::InvalidMaterial(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CellError::corner_count(4, 3);
        assert!(format!("{err}").contains("expected 4"));

        let err = CellError::corner_out_of_range(9, 8);
        assert!(format!("{err}").contains("corner index 9"));

        let err = CellError::invalid_material("negative modulus");
        assert!(format!("{err}").contains("negative modulus"));

        let err = CellError::InvalidThreshold(0.7);
        assert!(format!("{err}").contains("0.7"));
    }
}
