//! Error types for op data, op sequences and the optimizer.

use thiserror::Error;
use vfx_core::BitDepth;
use vfx_lut::LutError;

use crate::OpKind;

/// Error type for op validation, composition and evaluation.
///
/// Every variant that concerns a single op names its kind, and parameter
/// failures also name the parameter and the offending value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpError {
    /// A parameter failed validation.
    #[error("{kind}: invalid parameter '{param}' = {value}: {reason}")]
    InvalidParameter {
        /// Op kind raising the error
        kind: OpKind,
        /// Parameter name
        param: String,
        /// Offending value, as text
        value: String,
        /// What the validator expected
        reason: String,
    },

    /// The op cannot work at this bit depth.
    #[error("{kind}: unsupported bit depth {depth}")]
    UnsupportedBitDepth {
        /// Op kind raising the error
        kind: OpKind,
        /// The rejected depth
        depth: BitDepth,
    },

    /// An array does not have the expected shape.
    #[error("{kind}: dimension mismatch for '{param}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Op kind raising the error
        kind: OpKind,
        /// Parameter name
        param: String,
        /// Accepted shape, as text
        expected: String,
        /// Received element count
        actual: usize,
    },

    /// A matrix could not be inverted.
    #[error("{kind}: singular matrix cannot be inverted")]
    SingularMatrix {
        /// Op kind raising the error
        kind: OpKind,
    },

    /// A style name or tag was not recognized.
    #[error("{context}: unknown style '{name}'")]
    UnknownStyle {
        /// What was being looked up (an op kind, the built-in registry, ...)
        context: &'static str,
        /// The unrecognized name
        name: String,
    },

    /// A LUT could not be inverted in the requested mode.
    #[error("{kind}: LUT inversion failed: {reason}")]
    LutInversionFailure {
        /// Op kind raising the error
        kind: OpKind,
        /// Failure details
        reason: String,
    },

    /// An API was used out of order.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// Result type for op operations.
pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    /// Shorthand for [`OpError::InvalidParameter`] with a numeric value.
    pub fn invalid(kind: OpKind, param: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            kind,
            param: param.into(),
            value: vfx_core::format_sig7(value),
            reason: reason.into(),
        }
    }

    /// Converts an array-level LUT error, tagging it with the op kind.
    pub fn from_lut(kind: OpKind, err: LutError) -> Self {
        match err {
            LutError::InvalidSize(msg) => Self::InvalidParameter {
                kind,
                param: "size".into(),
                value: msg,
                reason: "unsupported LUT size".into(),
            },
            LutError::DimensionMismatch { expected, actual } => Self::DimensionMismatch {
                kind,
                param: "values".into(),
                expected: expected.to_string(),
                actual,
            },
            LutError::UnsupportedInterpolation(interp) => Self::InvalidParameter {
                kind,
                param: "interpolation".into(),
                value: interp.as_str().into(),
                reason: "not available for this LUT".into(),
            },
            LutError::InversionFailure(reason) => Self::LutInversionFailure { kind, reason },
        }
    }

    /// Whether the optimizer may swallow this error and leave the ops alone.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::SingularMatrix { .. } | Self::LutInversionFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_kind_param_value() {
        let err = OpError::invalid(OpKind::Gamma, "gamma", 200.0, "must be in [0.01, 100]");
        let msg = err.to_string();
        assert!(msg.contains("Gamma"));
        assert!(msg.contains("'gamma'"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn skippable_kinds() {
        assert!(OpError::SingularMatrix { kind: OpKind::Matrix }.is_skippable());
        assert!(
            OpError::LutInversionFailure { kind: OpKind::Lut3D, reason: "grid".into() }.is_skippable()
        );
        assert!(!OpError::ContractViolation("x".into()).is_skippable());
        assert!(!OpError::invalid(OpKind::Log, "base", 1.0, "cannot be 1").is_skippable());
    }

    #[test]
    fn lut_errors_keep_kind() {
        let err = OpError::from_lut(OpKind::Lut3D, LutError::DimensionMismatch { expected: 24, actual: 23 });
        assert_eq!(
            err,
            OpError::DimensionMismatch {
                kind: OpKind::Lut3D,
                param: "values".into(),
                expected: "24".into(),
                actual: 23
            }
        );
        let err = OpError::from_lut(OpKind::Lut1D, LutError::InversionFailure("flat".into()));
        assert!(err.is_skippable());
    }
}
