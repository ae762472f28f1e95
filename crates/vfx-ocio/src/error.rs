//! Error types for transform lowering, processors and engine configuration.
//!
//! Op-level failures pass through unchanged as [`OcioError::Op`]; this
//! layer only adds what it owns:
//! - reading and parsing engine configuration
//! - transforms that cannot be lowered (unknown built-in styles, bad shapes)

use std::path::PathBuf;

use thiserror::Error;
use vfx_ops::OpError;

/// Result type for transform and processor operations.
pub type OcioResult<T> = Result<T, OcioError>;

/// Errors raised while lowering transforms or building processors.
#[derive(Debug, Error)]
pub enum OcioError {
    /// An op failed validation, composition or evaluation.
    #[error(transparent)]
    Op(#[from] OpError),

    /// I/O error reading a configuration file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Transform fields that no op can represent.
    #[error("{transform}: {reason}")]
    InvalidTransform {
        /// Transform kind.
        transform: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// Configuration value out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OcioError {
    /// Op error behind this one, if any.
    pub fn as_op(&self) -> Option<&OpError> {
        match self {
            Self::Op(e) => Some(e),
            _ => None,
        }
    }
}
