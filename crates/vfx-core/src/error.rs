//! Error types for vfx-core parsing helpers.
//!
//! Only string conversions can fail at this level; numeric helpers are total.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when parsing core tags from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A bit-depth string was not recognized.
    #[error("unknown bit depth: '{0}'")]
    UnknownBitDepth(String),

    /// A direction string was not recognized.
    #[error("unknown transform direction: '{0}'")]
    UnknownDirection(String),
}
