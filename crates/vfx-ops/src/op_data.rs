//! Op records: a kind-tagged parameter variant plus the fields every op
//! carries.
//!
//! [`OpParams`] is the flat sum type over the op kinds. [`OpData`] wraps it
//! with the transform direction, the bit depths of the file it came from and
//! format metadata. Metadata and file depths exist for round-tripping only;
//! they take no part in evaluation, equality or cache identifiers.

use std::fmt;

use vfx_core::{BitDepth, FormatMetadata, TransformDirection};

use crate::allocation::AllocationData;
use crate::cdl::CdlData;
use crate::fixed_function::FixedFunctionData;
use crate::gamma::GammaData;
use crate::log_op::LogData;
use crate::lut1d::Lut1DData;
use crate::lut3d::Lut3DData;
use crate::matrix::MatrixData;
use crate::range::RangeData;
use crate::{OpError, OpResult};

/// Closed set of op kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum OpKind {
    Matrix,
    Range,
    Log,
    Gamma,
    Lut1D,
    Lut3D,
    Cdl,
    FixedFunction,
    Allocation,
    FileNoOp,
    LookNoOp,
}

impl OpKind {
    /// Kind name used in messages and cache identifiers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matrix => "Matrix",
            Self::Range => "Range",
            Self::Log => "Log",
            Self::Gamma => "Gamma",
            Self::Lut1D => "Lut1D",
            Self::Lut3D => "Lut3D",
            Self::Cdl => "CDL",
            Self::FixedFunction => "FixedFunction",
            Self::Allocation => "Allocation",
            Self::FileNoOp => "FileNoOp",
            Self::LookNoOp => "LookNoOp",
        }
    }

    /// Simplicity order used to break ties between rewrites; lower is
    /// simpler.
    pub const fn complexity_rank(self) -> u8 {
        match self {
            Self::Matrix => 0,
            Self::Range => 1,
            Self::Lut1D => 2,
            Self::Lut3D => 3,
            Self::Log => 4,
            Self::Gamma => 5,
            Self::Cdl => 6,
            Self::FixedFunction => 7,
            Self::Allocation | Self::FileNoOp | Self::LookNoOp => 8,
        }
    }

    /// Whether ops of this kind only record information.
    pub const fn is_record(self) -> bool {
        matches!(self, Self::Allocation | Self::FileNoOp | Self::LookNoOp)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific parameters.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum OpParams {
    Matrix(MatrixData),
    Range(RangeData),
    Log(LogData),
    Gamma(GammaData),
    Lut1D(Lut1DData),
    Lut3D(Lut3DData),
    Cdl(CdlData),
    FixedFunction(FixedFunctionData),
    Allocation(AllocationData),
    /// Marks the start of ops read from a file.
    FileNoOp { path: String },
    /// Marks the start of ops applied by a look.
    LookNoOp { look: String },
}

impl OpParams {
    /// Kind tag.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Matrix(_) => OpKind::Matrix,
            Self::Range(_) => OpKind::Range,
            Self::Log(_) => OpKind::Log,
            Self::Gamma(_) => OpKind::Gamma,
            Self::Lut1D(_) => OpKind::Lut1D,
            Self::Lut3D(_) => OpKind::Lut3D,
            Self::Cdl(_) => OpKind::Cdl,
            Self::FixedFunction(_) => OpKind::FixedFunction,
            Self::Allocation(_) => OpKind::Allocation,
            Self::FileNoOp { .. } => OpKind::FileNoOp,
            Self::LookNoOp { .. } => OpKind::LookNoOp,
        }
    }
}

/// One stage of a color transform.
#[derive(Debug, Clone)]
pub struct OpData {
    /// Kind-specific parameters.
    pub params: OpParams,
    /// Direction the parameters are evaluated in.
    pub direction: TransformDirection,
    /// Bit depth of the stored input side in the source file.
    pub file_in_depth: BitDepth,
    /// Bit depth of the stored output side in the source file.
    pub file_out_depth: BitDepth,
    /// Identifier, name, description and attributes.
    pub metadata: FormatMetadata,
}

impl PartialEq for OpData {
    /// Kind, direction and numeric parameters only.
    fn eq(&self, other: &Self) -> bool {
        self.direction == other.direction && self.params == other.params
    }
}

impl From<OpParams> for OpData {
    fn from(params: OpParams) -> Self {
        Self::new(params)
    }
}

impl OpData {
    /// Forward op with unknown file depths and no metadata.
    pub fn new(params: OpParams) -> Self {
        Self {
            params,
            direction: TransformDirection::Forward,
            file_in_depth: BitDepth::Unknown,
            file_out_depth: BitDepth::Unknown,
            metadata: FormatMetadata::default(),
        }
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the file bit depths.
    pub fn with_file_depths(mut self, file_in: BitDepth, file_out: BitDepth) -> Self {
        self.file_in_depth = file_in;
        self.file_out_depth = file_out;
        self
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: FormatMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Kind tag.
    pub fn kind(&self) -> OpKind {
        self.params.kind()
    }

    /// Checks the parameters and file depths; returns the first failure.
    pub fn validate(&self) -> OpResult<()> {
        let kind = self.kind();
        for depth in [self.file_in_depth, self.file_out_depth] {
            if depth != BitDepth::Unknown && !depth.is_supported() {
                return Err(OpError::UnsupportedBitDepth { kind, depth });
            }
        }
        match &self.params {
            OpParams::Matrix(m) => m.validate(),
            OpParams::Range(r) => r.validate(),
            OpParams::Log(l) => l.validate(),
            OpParams::Gamma(g) => g.validate(),
            OpParams::Lut1D(l) => l.validate(),
            OpParams::Lut3D(l) => l.validate(),
            OpParams::Cdl(c) => c.validate(),
            OpParams::FixedFunction(f) => f.validate(),
            OpParams::Allocation(a) => a.validate(),
            OpParams::FileNoOp { .. } | OpParams::LookNoOp { .. } => Ok(()),
        }
    }

    /// Same op evaluated in the other direction.
    ///
    /// Only the direction flips and the file depths swap; see
    /// [`resolve_direction`](Self::resolve_direction) for folding the
    /// direction into the parameters.
    pub fn inverse(&self) -> Self {
        Self {
            params: self.params.clone(),
            direction: self.direction.inverse(),
            file_in_depth: self.file_out_depth,
            file_out_depth: self.file_in_depth,
            metadata: self.metadata.clone(),
        }
    }

    /// Whether the inverse is computed by rewriting the parameters.
    ///
    /// Log and LUT ops keep the direction as a flag instead.
    pub fn has_analytic_inverse(&self) -> bool {
        matches!(
            self.params,
            OpParams::Matrix(_) | OpParams::Range(_) | OpParams::Gamma(_) | OpParams::Cdl(_) | OpParams::FixedFunction(_)
        ) || self.kind().is_record()
    }

    /// Folds an inverse direction into the parameters when the kind allows
    /// it, returning a forward op. Other ops are returned unchanged.
    pub fn resolve_direction(self) -> OpResult<Self> {
        if self.direction.is_forward() || !self.has_analytic_inverse() {
            return Ok(self);
        }
        let params = match &self.params {
            OpParams::Matrix(m) => OpParams::Matrix(m.inverse()?),
            OpParams::Range(r) => OpParams::Range(r.inverse()?),
            OpParams::Gamma(g) => OpParams::Gamma(g.inverse()),
            OpParams::Cdl(c) => OpParams::Cdl(c.inverse()),
            OpParams::FixedFunction(f) => OpParams::FixedFunction(f.inverse()),
            other => other.clone(),
        };
        Ok(Self { params, direction: TransformDirection::Forward, ..self })
    }

    /// Output equals input for every value in the unclamped domain.
    pub fn is_identity(&self) -> bool {
        match &self.params {
            OpParams::Matrix(m) => m.is_identity(),
            OpParams::Range(r) => r.is_identity(),
            OpParams::Log(_) => false,
            OpParams::Gamma(g) => g.is_identity(),
            OpParams::Lut1D(l) => l.is_identity(),
            OpParams::Lut3D(l) => l.is_identity(),
            OpParams::Cdl(c) => c.is_identity(),
            OpParams::FixedFunction(f) => f.is_no_op(),
            OpParams::Allocation(_) | OpParams::FileNoOp { .. } | OpParams::LookNoOp { .. } => true,
        }
    }

    /// Identity that does not clamp either; safe to drop.
    pub fn is_no_op(&self) -> bool {
        match &self.params {
            OpParams::Matrix(m) => m.is_identity(),
            OpParams::Range(_) | OpParams::Log(_) | OpParams::Lut3D(_) => false,
            OpParams::Gamma(g) => g.is_no_op(),
            OpParams::Lut1D(l) => l.is_no_op(),
            OpParams::Cdl(c) => c.is_no_op(),
            OpParams::FixedFunction(f) => f.is_no_op(),
            OpParams::Allocation(_) | OpParams::FileNoOp { .. } | OpParams::LookNoOp { .. } => true,
        }
    }

    /// Cheaper op with the same clamping as this identity, or left behind
    /// when this op cancels against its inverse.
    pub fn identity_replacement(&self) -> OpData {
        let params = match &self.params {
            OpParams::Range(r) => r.identity_replacement(),
            OpParams::Log(l) => l.identity_replacement(self.direction),
            OpParams::Gamma(g) => g.identity_replacement(),
            OpParams::Lut1D(l) => l.identity_replacement(self.direction),
            OpParams::Lut3D(l) => l.identity_replacement(),
            OpParams::Cdl(c) => c.identity_replacement(),
            OpParams::FixedFunction(f) => f.identity_replacement(),
            _ => OpParams::Matrix(MatrixData::identity()),
        };
        OpData::new(params).with_file_depths(self.file_in_depth, self.file_in_depth)
    }

    /// Whether `next` undoes `self` exactly (up to clamping).
    pub fn is_inverse(&self, next: &OpData) -> bool {
        let flipped = self.direction != next.direction;
        match (&self.params, &next.params) {
            (OpParams::Log(a), OpParams::Log(b)) => flipped && a == b,
            // A domain prefix runs before the lookup in both directions.
            (OpParams::Lut1D(a), OpParams::Lut1D(b)) => flipped && a.domain.is_none() && a.same_curves(b),
            (OpParams::Lut3D(a), OpParams::Lut3D(b)) => flipped && a.domain.is_none() && a.same_lattice(b),
            (OpParams::Gamma(a), OpParams::Gamma(b)) => {
                if flipped { a == b } else { a.inverse() == *b }
            }
            (OpParams::Cdl(a), OpParams::Cdl(b)) => {
                if flipped { a == b } else { a.inverse() == *b }
            }
            (OpParams::FixedFunction(a), OpParams::FixedFunction(b)) => {
                if flipped { a == b } else { a.is_inverse(b) }
            }
            _ => false,
        }
    }

    /// Fingerprint of kind, direction and parameters.
    pub fn cache_id(&self) -> String {
        let body = match &self.params {
            OpParams::Matrix(m) => m.cache_id(),
            OpParams::Range(r) => r.cache_id(),
            OpParams::Log(l) => l.cache_id(),
            OpParams::Gamma(g) => g.cache_id(),
            OpParams::Lut1D(l) => l.cache_id(),
            OpParams::Lut3D(l) => l.cache_id(),
            OpParams::Cdl(c) => c.cache_id(),
            OpParams::FixedFunction(f) => f.cache_id(),
            OpParams::Allocation(a) => a.cache_id(),
            OpParams::FileNoOp { path } => format!("FileNoOp {path}"),
            OpParams::LookNoOp { look } => format!("LookNoOp {look}"),
        };
        format!("<{} {}>", body, self.direction.as_str())
    }

    /// Splits a LUT carrying a domain prefix into the prefix matrix and the
    /// bare LUT, in evaluation order.
    pub fn split_domain(&self) -> Option<(OpData, OpData)> {
        let (prefix, lut) = match &self.params {
            OpParams::Lut1D(l) => {
                let prefix = l.domain?;
                (prefix, OpParams::Lut1D(Lut1DData { domain: None, ..l.clone() }))
            }
            OpParams::Lut3D(l) => {
                let prefix = l.domain?;
                (prefix, OpParams::Lut3D(Lut3DData { domain: None, ..l.clone() }))
            }
            _ => return None,
        };
        let matrix = OpData::new(OpParams::Matrix(prefix));
        let lut = OpData { params: lut, ..self.clone() };
        Some((matrix, lut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdl::CdlStyle;
    use crate::gamma::{GammaParams, GammaStyle};
    use vfx_lut::Lut1D;

    fn gamma22() -> OpData {
        OpData::new(OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.2))))
    }

    #[test]
    fn equality_ignores_metadata_and_depths() {
        let a = gamma22();
        let b = gamma22()
            .with_metadata(FormatMetadata::with_name("display"))
            .with_file_depths(BitDepth::UInt10, BitDepth::F32);
        assert_eq!(a, b);
        assert_eq!(a.cache_id(), b.cache_id());
        assert_ne!(a, a.inverse());
    }

    #[test]
    fn reserved_depths_are_rejected() {
        let op = gamma22().with_file_depths(BitDepth::UInt14, BitDepth::F32);
        assert!(matches!(
            op.validate(),
            Err(OpError::UnsupportedBitDepth { kind: OpKind::Gamma, depth: BitDepth::UInt14 })
        ));
    }

    #[test]
    fn resolve_direction_rewrites_parameters() {
        let inv = gamma22().inverse().resolve_direction().unwrap();
        assert!(inv.direction.is_forward());
        assert!(matches!(&inv.params, OpParams::Gamma(g) if g.style == GammaStyle::BasicRev));

        let log = OpData::new(OpParams::Log(LogData::log10())).inverse();
        let same = log.clone().resolve_direction().unwrap();
        assert_eq!(same.direction, TransformDirection::Inverse);

        let singular = OpData::new(OpParams::Matrix(MatrixData::scale([0.0, 1.0, 1.0, 1.0])));
        assert!(matches!(
            singular.inverse().resolve_direction(),
            Err(OpError::SingularMatrix { kind: OpKind::Matrix })
        ));
    }

    #[test]
    fn inverse_pairs() {
        let g = gamma22();
        assert!(g.is_inverse(&g.inverse()));
        assert!(g.is_inverse(&g.inverse().resolve_direction().unwrap()));
        assert!(!g.is_inverse(&g));

        let lut = OpData::new(OpParams::Lut1D(Lut1DData::new(Lut1D::from_fn(32, |x| x * x).unwrap())));
        assert!(lut.is_inverse(&lut.inverse()));

        let cdl = OpData::new(OpParams::Cdl(CdlData::new(
            [1.1, 1.0, 0.9],
            [0.0; 3],
            [1.0; 3],
            1.0,
            CdlStyle::AscFwd,
        )));
        assert!(cdl.is_inverse(&cdl.inverse()));
    }

    #[test]
    fn record_ops_are_no_ops() {
        let op = OpData::new(OpParams::LookNoOp { look: "warm".into() });
        assert!(op.is_no_op());
        assert!(op.kind().is_record());
        assert_eq!(op.cache_id(), "<LookNoOp warm forward>");
    }

    #[test]
    fn ranks_follow_simplicity() {
        let mut kinds = [OpKind::Gamma, OpKind::Lut3D, OpKind::Matrix, OpKind::Log, OpKind::Range];
        kinds.sort_by_key(|k| k.complexity_rank());
        assert_eq!(kinds, [OpKind::Matrix, OpKind::Range, OpKind::Lut3D, OpKind::Log, OpKind::Gamma]);
    }
}
