//! 1D Look-Up Table implementation.
//!
//! A 1D LUT applies an independent curve to each of the R, G and B channels.
//! Alpha is never touched.
//!
//! # Domains
//!
//! - **Standard**: `N` entries sampling the normalized input range [0, 1].
//!   Entry `i` holds the output for input `i / (N - 1)`. Inputs outside
//!   the range clamp to the first or last entry.
//! - **Half**: exactly 65536 entries, one per half-float code. Entry `i`
//!   holds the output for the input whose half bit pattern is `i`, so the
//!   whole float range is covered without clamping.
//!
//! # Structure
//!
//! ```text
//! values: [r0, g0, b0, r1, g1, b1, ... r(N-1), g(N-1), b(N-1)]
//! ```
//!
//! # Usage
//!
//! ```rust
//! use vfx_lut::Lut1D;
//!
//! let lut = Lut1D::from_fn(1024, |x| x * x).unwrap();
//! let rgb = lut.apply_rgb([0.5, 0.5, 0.5]);
//! assert!((rgb[0] - 0.25).abs() < 1e-3);
//! ```

use crate::{Interpolation, LutError, LutResult};
use vfx_core::half_domain::{
    self, HALF_DOMAIN_SIZE, NEG_HALF_MAX, NEG_INF, POS_HALF_MAX, POS_INF,
};

/// Absolute tolerance of the standard-domain identity test.
const IDENTITY_TOLERANCE: f32 = 1e-5;

/// Slack around [0, 1] before values count as extended range.
const RANGE_TOLERANCE: f32 = 1e-5;

/// Largest accepted standard-domain length.
pub const MAX_LENGTH: usize = 1024 * 1024;

/// A 1D lookup table with interleaved RGB values.
#[derive(Debug, Clone)]
pub struct Lut1D {
    values: Vec<f32>,
    half_domain: bool,
    raw_halfs: bool,
    interpolation: Interpolation,
}

impl PartialEq for Lut1D {
    /// Bitwise comparison so that NaN entries of half LUTs compare equal.
    fn eq(&self, other: &Self) -> bool {
        self.half_domain == other.half_domain
            && self.raw_halfs == other.raw_halfs
            && self.interpolation == other.interpolation
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Lut1D {
    // === Construction ===

    /// Creates a LUT from interleaved RGB values.
    ///
    /// # Errors
    ///
    /// - [`LutError::DimensionMismatch`] when the count is not a multiple of 3
    /// - [`LutError::InvalidSize`] for fewer than 2 entries, more than
    ///   [`MAX_LENGTH`], or a half domain with other than 65536 entries
    pub fn from_values(values: Vec<f32>, half_domain: bool) -> LutResult<Self> {
        if values.len() % 3 != 0 {
            return Err(LutError::DimensionMismatch {
                expected: values.len().next_multiple_of(3),
                actual: values.len(),
            });
        }
        let len = values.len() / 3;
        if half_domain && len != HALF_DOMAIN_SIZE {
            return Err(LutError::InvalidSize(format!(
                "half-domain LUT needs {HALF_DOMAIN_SIZE} entries, got {len}"
            )));
        }
        if len < 2 {
            return Err(LutError::InvalidSize(format!(
                "1D LUT needs at least 2 entries, got {len}"
            )));
        }
        if !half_domain && len > MAX_LENGTH {
            return Err(LutError::InvalidSize(format!(
                "1D LUT length {len} exceeds {MAX_LENGTH}"
            )));
        }
        Ok(Self {
            values,
            half_domain,
            raw_halfs: false,
            interpolation: Interpolation::Linear,
        })
    }

    /// Creates a LUT from three separate channel curves of equal length.
    pub fn from_channels(r: &[f32], g: &[f32], b: &[f32], half_domain: bool) -> LutResult<Self> {
        if g.len() != r.len() || b.len() != r.len() {
            return Err(LutError::DimensionMismatch {
                expected: r.len(),
                actual: if g.len() != r.len() { g.len() } else { b.len() },
            });
        }
        let values = r
            .iter()
            .zip(g)
            .zip(b)
            .flat_map(|((&r, &g), &b)| [r, g, b])
            .collect();
        Self::from_values(values, half_domain)
    }

    /// Samples `f` on a standard domain of `len` entries, same curve on all
    /// channels.
    pub fn from_fn(len: usize, f: impl Fn(f64) -> f64) -> LutResult<Self> {
        if len < 2 {
            return Err(LutError::InvalidSize(format!(
                "1D LUT needs at least 2 entries, got {len}"
            )));
        }
        let step = 1.0 / (len - 1) as f64;
        let values = (0..len)
            .flat_map(|i| {
                let v = f(i as f64 * step) as f32;
                [v, v, v]
            })
            .collect();
        Self::from_values(values, false)
    }

    /// Samples `f` at the value of every half code, same curve on all
    /// channels.
    pub fn from_fn_half(f: impl Fn(f64) -> f64) -> Self {
        let values = (0..=u16::MAX)
            .flat_map(|code| {
                let v = f(half_domain::code_to_f32(code) as f64) as f32;
                [v, v, v]
            })
            .collect();
        Self {
            values,
            half_domain: true,
            raw_halfs: false,
            interpolation: Interpolation::Linear,
        }
    }

    /// Identity on a standard domain.
    pub fn identity(len: usize) -> LutResult<Self> {
        Self::from_fn(len, |x| x)
    }

    /// Identity on the half domain.
    pub fn identity_half() -> Self {
        Self::from_fn_half(|x| x)
    }

    /// Sets the interpolation.
    ///
    /// # Errors
    ///
    /// [`LutError::UnsupportedInterpolation`] for tetrahedral.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> LutResult<Self> {
        if !interpolation.valid_for_1d() {
            return Err(LutError::UnsupportedInterpolation(interpolation));
        }
        self.interpolation = interpolation;
        Ok(self)
    }

    /// Marks the values as stored in a file as raw half bit patterns.
    pub fn set_raw_halfs(&mut self, raw: bool) {
        self.raw_halfs = raw;
    }

    // === Accessors ===

    /// Number of entries per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / 3
    }

    /// Always false for a constructed LUT; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether entries are indexed by half code.
    #[inline]
    pub fn is_half_domain(&self) -> bool {
        self.half_domain
    }

    /// Whether file values were raw half bit patterns.
    #[inline]
    pub fn raw_halfs(&self) -> bool {
        self.raw_halfs
    }

    /// Interpolation used by [`Lut1D::eval`].
    #[inline]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Interleaved RGB values.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mutable interleaved RGB values.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Value of entry `i` in channel `c`.
    #[inline]
    pub fn value(&self, i: usize, c: usize) -> f32 {
        self.values[i * 3 + c]
    }

    /// Input value sampled by entry `i`.
    #[inline]
    pub fn domain_value(&self, i: usize) -> f32 {
        if self.half_domain {
            half_domain::code_to_f32(i as u16)
        } else {
            i as f32 / (self.len() - 1) as f32
        }
    }

    // === Properties ===

    /// Whether the LUT reproduces its own domain.
    ///
    /// Standard domain: every entry within 1e-5 of `i / (N - 1)`.
    /// Half domain: every non-NaN entry within one half ULP of its code.
    pub fn is_identity(&self) -> bool {
        let len = self.len();
        if self.half_domain {
            (0..len).all(|i| {
                let code = i as u16;
                if half_domain::is_nan_code(code) {
                    return true;
                }
                (0..3).all(|c| {
                    let v = self.value(i, c);
                    !v.is_nan() && !halfs_differ(code, half_domain::f32_to_code(v), 1)
                })
            })
        } else {
            let step = 1.0 / (len - 1) as f32;
            (0..len).all(|i| {
                let aim = i as f32 * step;
                (0..3).all(|c| (self.value(i, c) - aim).abs() <= IDENTITY_TOLERANCE)
            })
        }
    }

    /// Whether any value falls outside [0, 1] (NaN ignored).
    pub fn has_extended_range(&self) -> bool {
        self.values
            .iter()
            .any(|&v| !v.is_nan() && (v < -RANGE_TOLERANCE || v > 1.0 + RANGE_TOLERANCE))
    }

    /// Whether the three channels hold the same curve.
    pub fn is_mono(&self) -> bool {
        self.values
            .chunks_exact(3)
            .all(|rgb| rgb[0].to_bits() == rgb[1].to_bits() && rgb[0].to_bits() == rgb[2].to_bits())
    }

    // === Evaluation ===

    /// Evaluates channel `c` at `x`.
    pub fn eval(&self, c: usize, x: f32) -> f32 {
        if self.half_domain {
            self.eval_half(c, x)
        } else {
            self.eval_standard(c, x)
        }
    }

    fn eval_standard(&self, c: usize, x: f32) -> f32 {
        let max_idx = (self.len() - 1) as f32;
        // f32::max drops NaN, so NaN lands on entry 0
        let idx = (x * max_idx).max(0.0).min(max_idx);

        if self.interpolation == Interpolation::Nearest {
            return self.value(idx.round() as usize, c);
        }

        let lo = idx.floor();
        let hi = idx.ceil();
        let lo_v = self.value(lo as usize, c);
        let hi_v = self.value(hi as usize, c);
        hi_v + (lo_v - hi_v) * (hi - idx)
    }

    fn eval_half(&self, c: usize, x: f32) -> f32 {
        let x = half_domain::sanitize(x);
        let code = half_domain::f32_to_code(x);

        if self.interpolation == Interpolation::Nearest {
            return self.value(code as usize, c);
        }

        let (a, b) = half_edges(code, x);
        let fa = half_domain::code_to_f32(a);
        let fb = half_domain::code_to_f32(b);
        let mut frac = (x - fa) / (fb - fa);
        if frac.is_nan() {
            frac = 0.0;
        }
        let va = self.value(a as usize, c);
        let vb = self.value(b as usize, c);
        vb + (va - vb) * (1.0 - frac)
    }

    /// Evaluates an RGB triple.
    #[inline]
    pub fn apply_rgb(&self, rgb: [f32; 3]) -> [f32; 3] {
        [self.eval(0, rgb[0]), self.eval(1, rgb[1]), self.eval(2, rgb[2])]
    }

    /// Applies the LUT in place to packed RGBA pixels.
    pub fn apply_rgba(&self, pixels: &mut [f32]) {
        for px in pixels.chunks_exact_mut(4) {
            let out = self.apply_rgb([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }

    // === Resampling helpers ===

    /// Values as packed RGBA pixels with alpha 1, ready to be pushed through
    /// a chain of renderers.
    pub fn to_rgba(&self) -> Vec<f32> {
        self.values
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 1.0])
            .collect()
    }

    /// Overwrites the values from packed RGBA pixels (alpha dropped).
    pub fn store_rgba(&mut self, pixels: &[f32]) -> LutResult<()> {
        if pixels.len() != self.len() * 4 {
            return Err(LutError::DimensionMismatch {
                expected: self.len() * 4,
                actual: pixels.len(),
            });
        }
        for (dst, src) in self.values.chunks_exact_mut(3).zip(pixels.chunks_exact(4)) {
            dst.copy_from_slice(&src[..3]);
        }
        Ok(())
    }
}

/// Adjacent half codes bracketing `x`, where `code` is the nearest code.
///
/// Infinite upper neighbours are replaced by the largest finite half.
fn half_edges(code: u16, x: f32) -> (u16, u16) {
    let hv = half_domain::code_to_f32(code);
    if hv.abs() > x.abs() {
        (code - 1, code)
    } else {
        let next = match code + 1 {
            POS_INF => POS_HALF_MAX,
            NEG_INF => NEG_HALF_MAX,
            n => n,
        };
        (code, next)
    }
}

/// Compares two half codes on a monotone integer scale.
pub(crate) fn halfs_differ(a: u16, b: u16, tolerance: i32) -> bool {
    let ordered = |h: u16| -> i32 {
        if h & 0x8000 != 0 { -((h & 0x7FFF) as i32) } else { h as i32 }
    };
    (ordered(a) - ordered(b)).abs() > tolerance
}
