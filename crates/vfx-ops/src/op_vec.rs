//! Ordered op sequence: the unit that gets finalized, optimized, inverted
//! and applied to pixels.
//!
//! # Lifecycle
//!
//! Ops are appended while the sequence is open. [`OpVec::finalize`] binds
//! every op to a renderer and freezes the sequence; after that only
//! [`OpVec::optimize`], [`OpVec::apply`] and [`OpVec::cache_id`] are
//! allowed. [`OpVec::invert`] returns a new open sequence.
//!
//! # Example
//!
//! ```
//! use vfx_ops::{MatrixData, OpParams, OpVec, OptimizationFlags};
//! use vfx_core::TransformDirection;
//!
//! let mut ops = OpVec::new();
//! ops.append(OpParams::Matrix(MatrixData::scale([2.0, 2.0, 2.0, 1.0])), TransformDirection::Forward)?;
//! ops.append(OpParams::Matrix(MatrixData::scale([0.5, 0.5, 0.5, 1.0])), TransformDirection::Forward)?;
//! ops.finalize(OptimizationFlags::DEFAULT)?;
//! ops.optimize(OptimizationFlags::DEFAULT)?;
//! assert!(ops.is_empty());
//! # Ok::<(), vfx_ops::OpError>(())
//! ```

use tracing::debug;
use vfx_core::{BitDepth, TransformDirection};

use crate::op::Op;
use crate::op_data::{OpData, OpParams};
use crate::{OpError, OpResult, OptimizationFlags, optimizer, parallel};

/// Pixel count above which [`OpVec::apply`] splits work across threads.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Ordered sequence of ops.
#[derive(Debug, Clone)]
pub struct OpVec {
    ops: Vec<Op>,
    finalized: Option<OptimizationFlags>,
    input_depth: BitDepth,
    parallel_threshold: usize,
}

impl Default for OpVec {
    fn default() -> Self {
        Self::new()
    }
}

impl OpVec {
    /// Empty, open sequence.
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            finalized: None,
            input_depth: BitDepth::F32,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the depth of the pixels the sequence will see first; integer
    /// depths let the optimizer drop clamps those values cannot exceed.
    pub fn with_input_depth(mut self, depth: BitDepth) -> Self {
        self.input_depth = depth;
        self
    }

    /// Sets the pixel count above which [`apply`](Self::apply) goes parallel.
    pub fn with_parallel_threshold(mut self, pixels: usize) -> Self {
        self.parallel_threshold = pixels;
        self
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the sequence holds no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Ops in evaluation order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Iterates the ops in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.ops.iter()
    }

    /// Flags of the last successful finalize.
    pub fn flags(&self) -> Option<OptimizationFlags> {
        self.finalized
    }

    /// Whether the sequence is frozen.
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    fn ensure_open(&self, what: &str) -> OpResult<()> {
        if self.is_finalized() {
            return Err(OpError::ContractViolation(format!("{what} on a finalized op sequence")));
        }
        Ok(())
    }

    fn ensure_finalized(&self, what: &str) -> OpResult<()> {
        if !self.is_finalized() {
            return Err(OpError::ContractViolation(format!("{what} before finalize")));
        }
        Ok(())
    }

    /// Appends one op.
    pub fn push(&mut self, data: OpData) -> OpResult<()> {
        self.ensure_open("push")?;
        self.ops.push(Op::new(data));
        Ok(())
    }

    /// Appends an op built from `params` evaluated in `direction`.
    pub fn append(&mut self, params: OpParams, direction: TransformDirection) -> OpResult<()> {
        self.push(OpData::new(params).with_direction(direction))
    }

    /// Appends every op of `other`, in order.
    pub fn extend(&mut self, other: OpVec) -> OpResult<()> {
        self.ensure_open("extend")?;
        self.ops.extend(other.ops.into_iter().map(|op| Op::new(op.into_data())));
        Ok(())
    }

    /// Validates every op, resolves analytic inverses and binds renderers.
    ///
    /// A second call with the same flags does nothing. On error the
    /// sequence stays open.
    pub fn finalize(&mut self, flags: OptimizationFlags) -> OpResult<()> {
        if self.finalized == Some(flags) {
            return Ok(());
        }
        for op in &mut self.ops {
            op.finalize(flags)?;
        }
        self.finalized = Some(flags);
        debug!(ops = self.ops.len(), %flags, "finalized op sequence");
        Ok(())
    }

    /// Rewrites the sequence into fewer or simpler ops and finalizes the
    /// result.
    pub fn optimize(&mut self, flags: OptimizationFlags) -> OpResult<()> {
        self.ensure_finalized("optimize")?;
        let data: Vec<OpData> = self.ops.iter().map(|op| op.data().clone()).collect();
        let data = optimizer::optimize(data, flags, self.input_depth)?;
        let mut ops: Vec<Op> = data.into_iter().map(Op::new).collect();
        for op in &mut ops {
            op.finalize(flags)?;
        }
        self.ops = ops;
        self.finalized = Some(flags);
        Ok(())
    }

    /// Reversed sequence with every direction flipped.
    ///
    /// LUTs carrying a matrix prefix are split first, so the prefix ends up
    /// after the inverse lookup. The result is open.
    pub fn invert(&self) -> OpResult<OpVec> {
        let mut data = Vec::with_capacity(self.ops.len());
        for op in self.ops.iter().rev() {
            match op.data().split_domain() {
                Some((prefix, lut)) => {
                    data.push(lut.inverse());
                    data.push(prefix.inverse());
                }
                None => data.push(op.data().inverse()),
            }
        }
        Ok(Self {
            ops: data.into_iter().map(Op::new).collect(),
            finalized: None,
            input_depth: BitDepth::F32,
            parallel_threshold: self.parallel_threshold,
        })
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [f32]) -> OpResult<()> {
        self.ensure_finalized("apply")?;
        if pixels.len() % 4 != 0 {
            return Err(OpError::ContractViolation(format!(
                "RGBA buffer length {} is not a multiple of 4",
                pixels.len()
            )));
        }
        if let Some(op) = self.ops.iter().find(|op| !op.is_finalized()) {
            return Err(OpError::ContractViolation(format!("{} op is not finalized", op.kind())));
        }
        parallel::apply_chain(&self.ops, pixels, self.parallel_threshold);
        Ok(())
    }

    /// Ordered concatenation of the op cache identifiers.
    pub fn cache_id(&self) -> OpResult<String> {
        self.ensure_finalized("cache id")?;
        let mut id = String::new();
        for op in &self.ops {
            let part = op
                .cache_id()
                .ok_or_else(|| OpError::ContractViolation(format!("{} op is not finalized", op.kind())))?;
            id.push_str(part);
        }
        Ok(id)
    }
}

impl<'a> IntoIterator for &'a OpVec {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::{GammaData, GammaParams, GammaStyle};
    use crate::log_op::LogData;
    use crate::lut1d::Lut1DData;
    use crate::matrix::MatrixData;
    use crate::op_data::OpKind;
    use approx::assert_abs_diff_eq;
    use vfx_lut::Lut1D;

    fn scale(s: f64) -> OpParams {
        OpParams::Matrix(MatrixData::scale([s, s, s, 1.0]))
    }

    fn gamma(g: f64) -> OpParams {
        OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(g)))
    }

    #[test]
    fn lifecycle_contracts() {
        let mut ops = OpVec::new();
        ops.append(scale(2.0), TransformDirection::Forward).unwrap();
        let mut px = [0.1, 0.2, 0.3, 1.0];
        assert!(matches!(ops.apply(&mut px), Err(OpError::ContractViolation(_))));
        assert!(matches!(ops.optimize(OptimizationFlags::DEFAULT), Err(OpError::ContractViolation(_))));
        assert!(ops.cache_id().is_err());

        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        assert!(matches!(ops.append(scale(1.0), TransformDirection::Forward), Err(OpError::ContractViolation(_))));

        let mut short = [0.0; 3];
        assert!(ops.apply(&mut short).is_err());
        ops.apply(&mut px).unwrap();
        assert_abs_diff_eq!(px[2], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn failed_finalize_stays_open() {
        let mut ops = OpVec::new();
        ops.append(gamma(1000.0), TransformDirection::Forward).unwrap();
        assert!(matches!(ops.finalize(OptimizationFlags::NONE), Err(OpError::InvalidParameter { .. })));
        assert!(!ops.is_finalized());
    }

    #[test]
    fn optimize_preserves_pixels() {
        let mut ops = OpVec::new();
        ops.append(scale(0.5), TransformDirection::Forward).unwrap();
        ops.append(gamma(2.0), TransformDirection::Forward).unwrap();
        ops.append(gamma(1.5), TransformDirection::Forward).unwrap();
        ops.append(scale(4.0), TransformDirection::Forward).unwrap();
        ops.finalize(OptimizationFlags::NONE).unwrap();

        let src = [0.2, 0.5, 0.9, 0.3, 0.0, 1.0, 0.7, 1.0];
        let mut plain = src;
        ops.apply(&mut plain).unwrap();

        let mut opt = ops.clone();
        opt.optimize(OptimizationFlags::DEFAULT).unwrap();
        assert_eq!(opt.len(), 3);
        let mut px = src;
        opt.apply(&mut px).unwrap();
        for (a, b) in px.iter().zip(&plain) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn invert_reverses_and_flips() {
        let mut ops = OpVec::new();
        ops.append(scale(2.0), TransformDirection::Forward).unwrap();
        ops.append(OpParams::Log(LogData::log2()), TransformDirection::Forward).unwrap();
        let inv = ops.invert().unwrap();
        assert_eq!(inv.ops()[0].kind(), OpKind::Log);
        assert_eq!(inv.ops()[0].direction(), TransformDirection::Inverse);
        assert_eq!(inv.ops()[1].direction(), TransformDirection::Inverse);

        let mut both = ops.clone();
        both.extend(inv).unwrap();
        both.finalize(OptimizationFlags::DEFAULT).unwrap();
        both.optimize(OptimizationFlags::DEFAULT).unwrap();
        // The log pair leaves its negative clamp; the scales meet and cancel.
        assert_eq!(both.len(), 1);
        assert_eq!(both.ops()[0].kind(), OpKind::Range);
    }

    #[test]
    fn invert_splits_lut_prefix() {
        let mut ops = OpVec::new();
        ops.append(scale(0.5), TransformDirection::Forward).unwrap();
        ops.append(
            OpParams::Lut1D(Lut1DData::new(Lut1D::from_fn(256, |x| x.powf(0.5)).unwrap())),
            TransformDirection::Forward,
        )
        .unwrap();
        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        ops.optimize(OptimizationFlags::DEFAULT).unwrap();
        assert_eq!(ops.len(), 1);

        let mut inv = ops.invert().unwrap();
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.ops()[1].kind(), OpKind::Matrix);
        inv.finalize(OptimizationFlags::LOSSLESS).unwrap();

        let mut px = [0.3, 0.6, 0.9, 1.0];
        let src = px;
        ops.apply(&mut px).unwrap();
        inv.apply(&mut px).unwrap();
        for (a, b) in px.iter().zip(&src) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn fast_lut_inverse_renders_alike_with_and_without_optimize() {
        let lut = Lut1DData::new(Lut1D::from_fn(1024, |x| x.powf(1.0 / 2.2)).unwrap());
        let data = OpData::new(OpParams::Lut1D(lut))
            .with_direction(TransformDirection::Inverse)
            .with_file_depths(BitDepth::UInt10, BitDepth::UInt10);
        let mut ops = OpVec::new();
        ops.push(data).unwrap();
        ops.finalize(OptimizationFlags::LUT_INV_FAST).unwrap();

        let src: Vec<f32> = (0..257)
            .flat_map(|i| {
                let v = i as f32 / 256.0;
                [v, 1.0 - v, 0.5 * v, 1.0]
            })
            .collect();
        let mut plain = src.clone();
        ops.apply(&mut plain).unwrap();

        let mut baked = ops.clone();
        baked.optimize(OptimizationFlags::LUT_INV_FAST).unwrap();
        assert_eq!(baked.ops()[0].direction(), TransformDirection::Forward);
        let mut px = src;
        baked.apply(&mut px).unwrap();
        assert_eq!(px, plain);
    }

    #[test]
    fn cache_id_tracks_parameters() {
        let build = |g: f64| {
            let mut ops = OpVec::new();
            ops.append(gamma(g), TransformDirection::Forward).unwrap();
            ops.finalize(OptimizationFlags::DEFAULT).unwrap();
            ops.cache_id().unwrap()
        };
        assert_eq!(build(2.2), build(2.2));
        assert_ne!(build(2.2), build(2.2001));
    }

    #[test]
    fn large_buffers_match_small_threshold() {
        let mut ops = OpVec::new().with_parallel_threshold(16);
        ops.append(gamma(2.2), TransformDirection::Forward).unwrap();
        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        let src: Vec<f32> = (0..4096).map(|i| i as f32 / 4095.0).collect();
        let mut par = src.clone();
        ops.apply(&mut par).unwrap();
        let seq = ops.clone().with_parallel_threshold(usize::MAX);
        let mut one = src;
        seq.apply(&mut one).unwrap();
        assert_eq!(par, one);
    }
}
