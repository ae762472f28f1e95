//! Matrix op: a 4x4 matrix with a 4-vector offset.
//!
//! # Formula
//!
//! ```text
//! out = M * in + offset        (RGBA column vector, row-major M)
//! ```
//!
//! Composition `(M2, o2) ∘ (M1, o1) = (M2·M1, M2·o1 + o2)` is done in double
//! precision and followed by a clean-up that snaps near-integer results, so
//! `diag(1/0.45) ∘ diag(0.45)` gives exact ones.
//!
//! # Example
//!
//! ```rust
//! use vfx_ops::matrix::MatrixData;
//!
//! let gain = MatrixData::scale([0.45, 0.45, 0.45, 1.0]);
//! let undo = MatrixData::scale([1.0 / 0.45, 1.0 / 0.45, 1.0 / 0.45, 1.0]);
//! assert!(gain.compose(&undo).is_identity());
//! ```

use vfx_core::BitDepth;
use vfx_math::{Mat3, Mat4, simd};

use crate::{OpError, OpKind, OpResult};

/// Relative tolerance of the post-composition clean-up.
const CLEANUP_REL_TOL: f64 = 1e-6;
/// Smallest absolute clean-up tolerance.
const CLEANUP_ABS_FLOOR: f64 = 1e-10;

/// Parameters of a matrix op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixData {
    /// Row-major 4x4 matrix; the last row and column address alpha.
    pub matrix: Mat4,
    /// Offset added after the multiply.
    pub offset: [f64; 4],
}

impl Default for MatrixData {
    fn default() -> Self {
        Self::identity()
    }
}

impl MatrixData {
    /// Identity matrix, zero offset.
    pub const fn identity() -> Self {
        Self { matrix: Mat4::IDENTITY, offset: [0.0; 4] }
    }

    /// Matrix with offset.
    pub const fn new(matrix: Mat4, offset: [f64; 4]) -> Self {
        Self { matrix, offset }
    }

    /// Diagonal scale.
    pub const fn scale(scale: [f64; 4]) -> Self {
        Self { matrix: Mat4::diagonal(scale), offset: [0.0; 4] }
    }

    /// Diagonal scale followed by an offset.
    pub const fn scale_offset(scale: [f64; 4], offset: [f64; 4]) -> Self {
        Self { matrix: Mat4::diagonal(scale), offset }
    }

    /// RGB 3x3 matrix; alpha passes through.
    pub const fn from_mat3(m: &Mat3) -> Self {
        Self { matrix: Mat4::from_mat3(m.m), offset: [0.0; 4] }
    }

    /// Builds from a flat row-major array of 9 (3x3) or 16 (4x4) values.
    pub fn from_slice(values: &[f64]) -> OpResult<Self> {
        match values.len() {
            9 => {
                let r = [
                    [values[0], values[1], values[2]],
                    [values[3], values[4], values[5]],
                    [values[6], values[7], values[8]],
                ];
                Ok(Self::new(Mat4::from_mat3(r), [0.0; 4]))
            }
            16 => {
                let mut m = [0.0; 16];
                m.copy_from_slice(values);
                Ok(Self::new(Mat4::from_row_array(m), [0.0; 4]))
            }
            n => Err(OpError::DimensionMismatch {
                kind: OpKind::Matrix,
                param: "matrix".into(),
                expected: "3x3 (9) or 4x4 (16) values".into(),
                actual: n,
            }),
        }
    }

    /// Scale converting normalized values between two boundary depths.
    ///
    /// `from` and `to` must both be evaluable depths.
    pub fn bit_depth_scale(from: BitDepth, to: BitDepth) -> OpResult<Self> {
        for depth in [from, to] {
            if !depth.is_supported() {
                return Err(OpError::UnsupportedBitDepth { kind: OpKind::Matrix, depth });
            }
        }
        let s = from
            .scale_to(to)
            .ok_or(OpError::UnsupportedBitDepth { kind: OpKind::Matrix, depth: from })?;
        Ok(Self::scale([s, s, s, s]))
    }

    /// Rejects non-finite coefficients.
    pub fn validate(&self) -> OpResult<()> {
        for (i, v) in self.matrix.m.iter().enumerate() {
            if !v.is_finite() {
                return Err(OpError::invalid(
                    OpKind::Matrix,
                    format!("matrix[{}][{}]", i / 4, i % 4),
                    *v,
                    "must be finite",
                ));
            }
        }
        for (i, v) in self.offset.iter().enumerate() {
            if !v.is_finite() {
                return Err(OpError::invalid(OpKind::Matrix, format!("offset[{i}]"), *v, "must be finite"));
            }
        }
        Ok(())
    }

    /// Whether all off-diagonal coefficients are zero.
    pub fn is_diagonal(&self) -> bool {
        (0..4).all(|r| (0..4).all(|c| r == c || self.matrix.get(r, c) == 0.0))
    }

    /// Whether any offset is non-zero.
    pub fn has_offsets(&self) -> bool {
        self.offset.iter().any(|&o| o != 0.0)
    }

    /// Whether alpha is touched (alpha row, column or offset differ from identity).
    pub fn has_alpha(&self) -> bool {
        let m = &self.matrix;
        m.get(3, 3) != 1.0
            || self.offset[3] != 0.0
            || (0..3).any(|i| m.get(3, i) != 0.0 || m.get(i, 3) != 0.0)
    }

    /// Whether every diagonal coefficient is one.
    pub fn is_unity_diagonal(&self) -> bool {
        self.matrix.diag().iter().all(|&d| d == 1.0)
    }

    /// Whether any off-diagonal of the upper 3x3 is non-zero.
    pub fn has_channel_crosstalk(&self) -> bool {
        (0..3).any(|r| (0..3).any(|c| r != c && self.matrix.get(r, c) != 0.0))
    }

    /// Exact identity (unit matrix, zero offset).
    pub fn is_identity(&self) -> bool {
        self.matrix == Mat4::IDENTITY && !self.has_offsets()
    }

    /// `(s, o)` when this is `out = s * in + o` on RGB with alpha untouched.
    pub fn uniform_rgb_scale(&self) -> Option<(f64, f64)> {
        if !self.is_diagonal() || self.has_alpha() {
            return None;
        }
        let d = self.matrix.diag();
        let o = self.offset;
        (d[0] == d[1] && d[1] == d[2] && o[0] == o[1] && o[1] == o[2]).then_some((d[0], o[0]))
    }

    /// Inverse `(M⁻¹, -M⁻¹·o)`.
    pub fn inverse(&self) -> OpResult<Self> {
        let inv = self.matrix.inverse().ok_or(OpError::SingularMatrix { kind: OpKind::Matrix })?;
        let o = inv.mul_vec4(self.offset);
        Ok(Self::new(inv, [-o[0], -o[1], -o[2], -o[3]]))
    }

    /// Applies `self` first, then `next`, and cleans up the result.
    pub fn compose(&self, next: &Self) -> Self {
        let matrix = next.matrix.mul_mat(&self.matrix);
        let o = next.matrix.mul_vec4(self.offset);
        let offset = [
            o[0] + next.offset[0],
            o[1] + next.offset[1],
            o[2] + next.offset[2],
            o[3] + next.offset[3],
        ];
        let mut out = Self::new(matrix, offset);
        out.cleanup();
        out
    }

    /// Snaps coefficients and offsets that sit within tolerance of an integer.
    pub fn cleanup(&mut self) {
        let tol = (self.matrix.max_abs() * CLEANUP_REL_TOL).max(CLEANUP_ABS_FLOOR);
        let snap = |v: &mut f64| {
            let r = v.round();
            if (*v - r).abs() < tol {
                *v = r;
            }
        };
        self.matrix.m.iter_mut().for_each(snap);
        self.offset.iter_mut().for_each(snap);
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = String::from("Matrix");
        for v in self.matrix.m.iter().chain(self.offset.iter()) {
            s.push(' ');
            s.push_str(&vfx_core::format_sig7(*v));
        }
        s
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// CPU kernel for a matrix op, specialized on its shape.
#[derive(Debug, Clone)]
pub enum MatrixRenderer {
    /// Diagonal matrix, no offset.
    Scale([f32; 4]),
    /// Diagonal matrix plus offset.
    ScaleOffset([f32; 4], [f32; 4]),
    /// Full matrix, no offset.
    Matrix([f32; 16]),
    /// Full matrix plus offset.
    MatrixOffset([f32; 16], [f32; 4]),
}

impl MatrixRenderer {
    /// Picks the cheapest kernel that reproduces `data`.
    pub fn new(data: &MatrixData) -> Self {
        let offset = data.offset.map(|o| o as f32);
        if data.is_diagonal() {
            let diag = data.matrix.diag().map(|d| d as f32);
            if data.has_offsets() { Self::ScaleOffset(diag, offset) } else { Self::Scale(diag) }
        } else {
            let m = data.matrix.to_f32();
            if data.has_offsets() { Self::MatrixOffset(m, offset) } else { Self::Matrix(m) }
        }
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [f32]) {
        match self {
            Self::Scale(s) => simd::scale_rgba(pixels, *s),
            Self::ScaleOffset(s, o) => simd::scale_offset_rgba(pixels, *s, *o),
            Self::Matrix(m) => simd::matrix_rgba(pixels, m),
            Self::MatrixOffset(m, o) => simd::matrix_offset_rgba(pixels, m, *o),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn full() -> MatrixData {
        MatrixData::new(
            Mat4::from_row_array([
                0.6954522414, 0.1406786965, 0.1638690622, 0.0, //
                0.0447945634, 0.8596711185, 0.0955343182, 0.0, //
                -0.0055258826, 0.0040252103, 1.0015006723, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]),
            [0.01, -0.02, 0.03, 0.0],
        )
    }

    #[test]
    fn from_slice_sizes() {
        let m = MatrixData::from_slice(&[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]).unwrap();
        assert_eq!(m.matrix.diag(), [2.0, 2.0, 2.0, 1.0]);
        assert!(MatrixData::from_slice(&[0.0; 16]).is_ok());
        let err = MatrixData::from_slice(&[1.0; 12]).unwrap_err();
        assert!(matches!(err, OpError::DimensionMismatch { actual: 12, .. }));
    }

    #[test]
    fn inverse_roundtrip() {
        let m = full();
        let inv = m.inverse().unwrap();
        let id = m.compose(&inv);
        assert!(id.is_identity(), "{id:?}");

        let v = [0.3, 0.5, 0.7, 1.0];
        let fwd = m.matrix.mul_vec4(v);
        let fwd = [fwd[0] + m.offset[0], fwd[1] + m.offset[1], fwd[2] + m.offset[2], fwd[3]];
        let back = inv.matrix.mul_vec4(fwd);
        for c in 0..3 {
            assert_abs_diff_eq!(back[c] + inv.offset[c], v[c], epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_matrix() {
        let m = MatrixData::scale([1.0, 0.0, 1.0, 1.0]);
        assert_eq!(m.inverse().unwrap_err(), OpError::SingularMatrix { kind: OpKind::Matrix });
    }

    #[test]
    fn cleanup_snaps_near_integers() {
        let a = MatrixData::scale([0.45, 0.45, 0.45, 1.0]);
        let b = MatrixData::scale([1.0 / 0.45, 1.0 / 0.45, 1.0 / 0.45, 1.0]);
        let c = a.compose(&b);
        assert_eq!(c.matrix, Mat4::IDENTITY);

        // Genuine non-integers are left alone.
        let d = MatrixData::scale([0.5, 0.5, 0.5, 1.0]).compose(&MatrixData::scale([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(d.matrix.diag(), [0.25, 0.25, 0.25, 1.0]);
    }

    #[test]
    fn compose_order() {
        // Scale then offset differs from offset then scale.
        let s = MatrixData::scale([2.0, 2.0, 2.0, 1.0]);
        let o = MatrixData::scale_offset([1.0; 4], [0.1, 0.1, 0.1, 0.0]);
        assert_eq!(s.compose(&o).offset, [0.1, 0.1, 0.1, 0.0]);
        assert_eq!(o.compose(&s).offset, [0.2, 0.2, 0.2, 0.0]);
    }

    #[test]
    fn predicates() {
        let m = full();
        assert!(m.has_channel_crosstalk());
        assert!(m.has_offsets());
        assert!(!m.has_alpha());
        assert!(!m.is_diagonal());
        let s = MatrixData::scale_offset([2.0, 2.0, 2.0, 1.0], [0.5; 4]);
        assert!(s.has_alpha());
        assert_eq!(MatrixData::scale_offset([2.0, 2.0, 2.0, 1.0], [0.5, 0.5, 0.5, 0.0]).uniform_rgb_scale(), Some((2.0, 0.5)));
        assert!(MatrixData::identity().is_unity_diagonal());
    }

    #[test]
    fn bit_depth_scale() {
        let m = MatrixData::bit_depth_scale(BitDepth::UInt10, BitDepth::F32).unwrap();
        assert_abs_diff_eq!(m.matrix.get(0, 0), 1.0 / 1023.0, epsilon = 1e-15);
        let err = MatrixData::bit_depth_scale(BitDepth::UInt14, BitDepth::F32).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedBitDepth { depth: BitDepth::UInt14, .. }));
    }

    #[test]
    fn renderers_agree() {
        let cases = [
            MatrixData::scale([2.0, 2.0, 2.0, 1.0]),
            MatrixData::scale_offset([2.0, 0.5, 1.0, 1.0], [0.1, 0.0, -0.1, 0.0]),
            MatrixData { offset: [0.0; 4], ..full() },
            full(),
        ];
        for data in cases {
            let r = MatrixRenderer::new(&data);
            let mut px = [0.1f32, 0.2, 0.3, 1.0];
            r.apply(&mut px);
            let expect = data.matrix.mul_vec4([0.1, 0.2, 0.3, 1.0]);
            for c in 0..4 {
                assert_abs_diff_eq!(px[c] as f64, expect[c] + data.offset[c], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn validate_rejects_nan() {
        let mut m = MatrixData::identity();
        m.offset[1] = f64::NAN;
        assert!(matches!(m.validate(), Err(OpError::InvalidParameter { .. })));
    }
}
