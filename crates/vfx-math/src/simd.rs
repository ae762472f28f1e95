//! SIMD RGBA kernels.
//!
//! One RGBA pixel fits an `f32x4` lane group, so the affine renderers process
//! a pixel per vector operation using the `wide` crate (portable SIMD on
//! stable Rust). Results match the scalar formulas up to fused rounding.
//!
//! # Example
//!
//! ```rust
//! use vfx_math::simd::scale_offset_rgba;
//!
//! let mut px = [0.5, 0.5, 0.5, 1.0];
//! scale_offset_rgba(&mut px, [2.0, 2.0, 2.0, 1.0], [0.1, 0.0, 0.0, 0.0]);
//! assert!((px[0] - 1.1).abs() < 1e-6);
//! ```

use wide::f32x4;

/// `out = in * scale` per channel, in place over RGBA pixels.
pub fn scale_rgba(pixels: &mut [f32], scale: [f32; 4]) {
    let s = f32x4::from(scale);
    for px in pixels.chunks_exact_mut(4) {
        let v = f32x4::from([px[0], px[1], px[2], px[3]]) * s;
        px.copy_from_slice(&v.to_array());
    }
}

/// `out = in * scale + offset` per channel, in place over RGBA pixels.
pub fn scale_offset_rgba(pixels: &mut [f32], scale: [f32; 4], offset: [f32; 4]) {
    let s = f32x4::from(scale);
    let o = f32x4::from(offset);
    for px in pixels.chunks_exact_mut(4) {
        let v = f32x4::from([px[0], px[1], px[2], px[3]]) * s + o;
        px.copy_from_slice(&v.to_array());
    }
}

/// Column vectors of a row-major 4x4 matrix.
#[inline]
fn columns(m: &[f32; 16]) -> [f32x4; 4] {
    [
        f32x4::from([m[0], m[4], m[8], m[12]]),
        f32x4::from([m[1], m[5], m[9], m[13]]),
        f32x4::from([m[2], m[6], m[10], m[14]]),
        f32x4::from([m[3], m[7], m[11], m[15]]),
    ]
}

/// `out = M * in` over RGBA pixels (row-major `m`).
pub fn matrix_rgba(pixels: &mut [f32], m: &[f32; 16]) {
    let [c0, c1, c2, c3] = columns(m);
    for px in pixels.chunks_exact_mut(4) {
        let v = c0 * f32x4::splat(px[0])
            + c1 * f32x4::splat(px[1])
            + c2 * f32x4::splat(px[2])
            + c3 * f32x4::splat(px[3]);
        px.copy_from_slice(&v.to_array());
    }
}

/// `out = M * in + offset` over RGBA pixels (row-major `m`).
pub fn matrix_offset_rgba(pixels: &mut [f32], m: &[f32; 16], offset: [f32; 4]) {
    let [c0, c1, c2, c3] = columns(m);
    let o = f32x4::from(offset);
    for px in pixels.chunks_exact_mut(4) {
        let v = c0 * f32x4::splat(px[0])
            + c1 * f32x4::splat(px[1])
            + c2 * f32x4::splat(px[2])
            + c3 * f32x4::splat(px[3])
            + o;
        px.copy_from_slice(&v.to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_matches_scalar() {
        let m = [
            1.0, 0.5, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.25, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 2.0,
        ];
        let mut px = [0.2, 0.4, 0.6, 0.5, 1.0, 1.0, 1.0, 1.0];
        matrix_offset_rgba(&mut px, &m, [0.1, 0.0, 0.0, 0.0]);
        assert!((px[0] - (0.2 + 0.2 + 0.1)).abs() < 1e-6);
        assert!((px[1] - 0.4).abs() < 1e-6);
        assert!((px[2] - (0.05 + 0.6)).abs() < 1e-6);
        assert!((px[3] - 1.0).abs() < 1e-6);
        assert!((px[4] - 1.6).abs() < 1e-6);
    }

    #[test]
    fn scale_only() {
        let mut px = [0.1, 0.2, 0.3, 1.0];
        scale_rgba(&mut px, [2.0, 2.0, 2.0, 1.0]);
        assert_eq!(px, [0.2, 0.4, 0.6, 1.0]);
    }
}
