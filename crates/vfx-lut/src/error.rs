//! LUT error types.

use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur while building or inverting LUTs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LutError {
    /// Invalid LUT size (too small, too large, or wrong for a half domain).
    #[error("invalid LUT size: {0}")]
    InvalidSize(String),

    /// The value buffer does not match the declared grid.
    #[error("LUT value count mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected number of values
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// The interpolation is not available for this LUT kind.
    #[error("interpolation {0:?} is not supported here")]
    UnsupportedInterpolation(crate::Interpolation),

    /// The LUT cannot be inverted.
    #[error("LUT inversion failed: {0}")]
    InversionFailure(String),
}
