//! Transform processor for applying color conversions.
//!
//! A processor lowers a transform to ops, adds bit-depth scaling at the
//! boundaries, finalizes and optimizes the sequence once, then applies it
//! to as many buffers as needed. Processors are immutable after
//! construction and can be shared across threads.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::TransformDirection;
//! use vfx_ocio::{EngineConfig, Processor, Transform};
//!
//! let transform = Transform::builtin("ACEScg_to_ACES2065-1")?;
//! let processor = Processor::from_transform(&transform, TransformDirection::Forward, &EngineConfig::default())?;
//!
//! let mut pixels = [[0.18_f32, 0.18, 0.18]; 16];
//! processor.apply_rgb(&mut pixels)?;
//! assert!((pixels[0][0] - 0.18).abs() < 1e-4);
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use tracing::{debug, info_span};
use vfx_core::{BitDepth, TransformDirection, quantize};
use vfx_ops::{MatrixData, OpParams, OpVec};

use crate::builder::build_ops;
use crate::config::EngineConfig;
use crate::transform::Transform;
use crate::OcioResult;

/// Compiled, optimized color conversion.
#[derive(Debug)]
pub struct Processor {
    ops: OpVec,
    input_bit_depth: BitDepth,
    output_bit_depth: BitDepth,
}

impl Processor {
    /// Builds a processor for `transform` evaluated in `direction`.
    pub fn from_transform(transform: &Transform, direction: TransformDirection, config: &EngineConfig) -> OcioResult<Self> {
        let span = info_span!("processor", transform = transform.type_name(), %direction);
        let _guard = span.enter();
        config.validate()?;

        let mut ops = OpVec::new()
            .with_input_depth(config.input_bit_depth)
            .with_parallel_threshold(config.parallel_threshold);
        if config.input_bit_depth.is_integer() {
            let to_float = MatrixData::bit_depth_scale(config.input_bit_depth, BitDepth::F32)?;
            ops.append(OpParams::Matrix(to_float), TransformDirection::Forward)?;
        }
        build_ops(&mut ops, transform, direction)?;
        if config.output_bit_depth.is_integer() {
            let to_int = MatrixData::bit_depth_scale(BitDepth::F32, config.output_bit_depth)?;
            ops.append(OpParams::Matrix(to_int), TransformDirection::Forward)?;
        }
        let lowered = ops.len();

        let flags = config.effective_flags();
        ops.finalize(flags)?;
        ops.optimize(flags)?;
        debug!(lowered, optimized = ops.len(), %flags, "built processor");

        Ok(Self { ops, input_bit_depth: config.input_bit_depth, output_bit_depth: config.output_bit_depth })
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply_packed(&self, pixels: &mut [f32]) -> OcioResult<()> {
        self.ops.apply(pixels)?;
        if let Some(max) = self.output_max() {
            for v in pixels.iter_mut() {
                *v = quantize(*v, max);
            }
        }
        Ok(())
    }

    /// Processes RGBA pixels in place.
    pub fn apply_rgba(&self, pixels: &mut [[f32; 4]]) -> OcioResult<()> {
        self.apply_packed(pixels.as_flattened_mut())
    }

    /// Processes RGB pixels in place; alpha is 1 while the ops run.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) -> OcioResult<()> {
        let alpha = self.input_bit_depth.max_value().filter(|_| self.input_bit_depth.is_integer()).unwrap_or(1.0) as f32;
        let mut rgba: Vec<[f32; 4]> = pixels.iter().map(|&[r, g, b]| [r, g, b, alpha]).collect();
        self.apply_rgba(&mut rgba)?;
        for (dst, src) in pixels.iter_mut().zip(&rgba) {
            dst.copy_from_slice(&src[..3]);
        }
        Ok(())
    }

    /// Processes one RGBA pixel.
    pub fn apply_pixel(&self, rgba: [f32; 4]) -> OcioResult<[f32; 4]> {
        let mut px = [rgba];
        self.apply_rgba(&mut px)?;
        Ok(px[0])
    }

    fn output_max(&self) -> Option<f32> {
        if self.output_bit_depth.is_integer() {
            self.output_bit_depth.max_value().map(|m| m as f32)
        } else {
            None
        }
    }

    /// Fingerprint of the optimized op sequence.
    pub fn cache_id(&self) -> OcioResult<String> {
        Ok(self.ops.cache_id()?)
    }

    /// Number of ops after optimization.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether the processor leaves pixels unchanged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Optimized ops, for inspection.
    pub fn op_vec(&self) -> &OpVec {
        &self.ops
    }

    /// Depth of the pixels handed to the processor.
    #[inline]
    pub fn input_bit_depth(&self) -> BitDepth {
        self.input_bit_depth
    }

    /// Depth of the pixels the processor returns.
    #[inline]
    pub fn output_bit_depth(&self) -> BitDepth {
        self.output_bit_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::*;
    use approx::assert_abs_diff_eq;
    use vfx_ops::{OpKind, OptimizationFlags};

    fn processor(t: impl Into<Transform>, config: &EngineConfig) -> Processor {
        Processor::from_transform(&t.into(), TransformDirection::Forward, config).unwrap()
    }

    #[test]
    fn gamma_pair_optimizes_away() {
        let g = ExponentTransform::new(2.2);
        let group = GroupTransform::new(vec![g.clone().into(), g.into()]);
        let mut t: Transform = group.into();
        if let Transform::Group(g) = &mut t {
            g.transforms[1].set_direction(TransformDirection::Inverse);
        }
        let p = processor(t, &EngineConfig::default());
        assert!(p.op_vec().iter().all(|op| op.kind() == OpKind::Range));

        let px = p.apply_pixel([0.18, 0.5, 0.9, 1.0]).unwrap();
        assert_abs_diff_eq!(px[0], 0.18, epsilon = 1e-6);
        assert_abs_diff_eq!(px[2], 0.9, epsilon = 1e-6);
    }

    #[test]
    fn unoptimized_keeps_every_op() {
        let t = GroupTransform::new(vec![MatrixTransform::default().into(), MatrixTransform::default().into()]);
        let config = EngineConfig::default().with_optimization(OptimizationFlags::NONE);
        assert_eq!(processor(t.clone(), &config).num_ops(), 2);
        assert!(processor(t, &EngineConfig::default()).is_empty());
    }

    #[test]
    fn integer_boundaries_scale_and_quantize() {
        let config = EngineConfig::default().with_bit_depths(BitDepth::UInt8, BitDepth::UInt10);
        let p = processor(MatrixTransform::default(), &config);
        assert_eq!(p.num_ops(), 1);

        let mut px = [[255.0f32, 128.0, 0.0, 255.0], [300.0, -4.0, 1.0, 0.0]];
        p.apply_rgba(&mut px).unwrap();
        assert_eq!(px[0], [1023.0, 514.0, 0.0, 1023.0]);
        assert_eq!(px[1], [1023.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn rgb_matches_rgba() {
        let t = Transform::builtin("DISPLAY - CIE-XYZ-D65_to_sRGB").unwrap();
        let p = Processor::from_transform(&t, TransformDirection::Forward, &EngineConfig::default()).unwrap();
        let mut rgb = [[0.3f32, 0.4, 0.2]];
        p.apply_rgb(&mut rgb).unwrap();
        let rgba = p.apply_pixel([0.3, 0.4, 0.2, 1.0]).unwrap();
        assert_eq!(rgb[0], [rgba[0], rgba[1], rgba[2]]);
    }

    #[test]
    fn cache_id_follows_parameters() {
        let config = EngineConfig::default();
        let a = processor(ExponentTransform::new(2.2), &config).cache_id().unwrap();
        let b = processor(ExponentTransform::new(2.2), &config).cache_id().unwrap();
        let c = processor(ExponentTransform::new(2.4), &config).cache_id().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn reserved_depths_are_rejected() {
        let config = EngineConfig::default().with_bit_depths(BitDepth::UInt14, BitDepth::F32);
        let t: Transform = MatrixTransform::default().into();
        assert!(Processor::from_transform(&t, TransformDirection::Forward, &config).is_err());
    }
}
