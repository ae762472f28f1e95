//! 3D Look-Up Table implementation.
//!
//! A 3D LUT maps RGB input to RGB output through a cubic lattice of
//! `L x L x L` sample points spanning [0, 1] on every axis.
//!
//! # Structure
//!
//! ```text
//! index(r, g, b) = 3 * ((r * L + g) * L + b) + channel
//! ```
//!
//! Blue varies fastest. Inputs are clamped to [0, 1] before lookup; NaN
//! components land on the first lattice plane.
//!
//! # Interpolation
//!
//! - **Trilinear**: blends the 8 corners of the enclosing cell.
//! - **Tetrahedral**: splits the cell into 6 tetrahedra along the main
//!   diagonal and blends 4 corners. Cheaper, and preserves the neutral axis.
//!
//! # Usage
//!
//! ```rust
//! use vfx_lut::{Interpolation, Lut3D};
//!
//! let lut = Lut3D::identity(17)
//!     .unwrap()
//!     .with_interpolation(Interpolation::Tetrahedral);
//! let rgb = lut.apply([0.5, 0.3, 0.2]);
//! assert!((rgb[1] - 0.3).abs() < 1e-6);
//! ```

use crate::{Interpolation, LutError, LutResult};

/// Largest accepted grid size.
pub const MAX_GRID_SIZE: usize = 129;

/// A 3D lookup table.
#[derive(Debug, Clone)]
pub struct Lut3D {
    values: Vec<f32>,
    grid_size: usize,
    interpolation: Interpolation,
}

impl PartialEq for Lut3D {
    fn eq(&self, other: &Self) -> bool {
        self.grid_size == other.grid_size
            && self.interpolation == other.interpolation
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Lut3D {
    /// Creates a LUT from interleaved RGB values, blue fastest.
    ///
    /// # Errors
    ///
    /// - [`LutError::InvalidSize`] for a grid below 2 or above [`MAX_GRID_SIZE`]
    /// - [`LutError::DimensionMismatch`] when `values.len() != 3 * size^3`
    pub fn from_values(grid_size: usize, values: Vec<f32>) -> LutResult<Self> {
        check_grid_size(grid_size)?;
        let expected = 3 * grid_size * grid_size * grid_size;
        if values.len() != expected {
            return Err(LutError::DimensionMismatch { expected, actual: values.len() });
        }
        Ok(Self { values, grid_size, interpolation: Interpolation::Linear })
    }

    /// Samples `f` on every lattice point.
    pub fn from_fn(grid_size: usize, f: impl Fn([f64; 3]) -> [f64; 3]) -> LutResult<Self> {
        check_grid_size(grid_size)?;
        let step = 1.0 / (grid_size - 1) as f64;
        let mut values = Vec::with_capacity(3 * grid_size * grid_size * grid_size);
        for r in 0..grid_size {
            for g in 0..grid_size {
                for b in 0..grid_size {
                    let out = f([r as f64 * step, g as f64 * step, b as f64 * step]);
                    values.extend(out.iter().map(|&v| v as f32));
                }
            }
        }
        Ok(Self { values, grid_size, interpolation: Interpolation::Linear })
    }

    /// Identity lattice.
    pub fn identity(grid_size: usize) -> LutResult<Self> {
        Self::from_fn(grid_size, |rgb| rgb)
    }

    /// Sets the interpolation.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Lattice points per axis.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Interpolation used by [`Lut3D::apply`].
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

    /// Offset of lattice point `(r, g, b)` in [`Lut3D::values`].
    #[inline]
    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        3 * ((r * self.grid_size + g) * self.grid_size + b)
    }

    /// Output stored at lattice point `(r, g, b)`.
    #[inline]
    pub fn node(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let i = self.index(r, g, b);
        [self.values[i], self.values[i + 1], self.values[i + 2]]
    }

    /// Whether any value falls outside [0, 1].
    pub fn has_extended_range(&self) -> bool {
        self.values.iter().any(|&v| !v.is_nan() && !(-1e-5..=1.0 + 1e-5).contains(&v))
    }

    /// Evaluates the LUT at `rgb`.
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self.interpolation {
            Interpolation::Nearest => self.apply_nearest(rgb),
            Interpolation::Linear => self.apply_trilinear(rgb),
            Interpolation::Tetrahedral => self.apply_tetrahedral(rgb),
        }
    }

    /// Applies the LUT in place to packed RGBA pixels.
    pub fn apply_rgba(&self, pixels: &mut [f32]) {
        for px in pixels.chunks_exact_mut(4) {
            let out = self.apply([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }

    /// Lattice coordinates of `rgb`: base index per axis and fraction.
    fn locate(&self, rgb: [f32; 3]) -> ([usize; 3], [f32; 3]) {
        let n = (self.grid_size - 1) as f32;
        let mut base = [0usize; 3];
        let mut frac = [0f32; 3];
        for c in 0..3 {
            // max() drops NaN
            let x = (rgb[c].max(0.0).min(1.0)) * n;
            let i = (x.floor() as usize).min(self.grid_size - 2);
            base[c] = i;
            frac[c] = x - i as f32;
        }
        (base, frac)
    }

    fn apply_nearest(&self, rgb: [f32; 3]) -> [f32; 3] {
        let (i, f) = self.locate(rgb);
        let pick = |c: usize| i[c] + usize::from(f[c] >= 0.5);
        self.node(pick(0), pick(1), pick(2))
    }

    fn apply_trilinear(&self, rgb: [f32; 3]) -> [f32; 3] {
        let ([ri, gi, bi], [rf, gf, bf]) = self.locate(rgb);

        let c000 = self.node(ri, gi, bi);
        let c001 = self.node(ri, gi, bi + 1);
        let c010 = self.node(ri, gi + 1, bi);
        let c011 = self.node(ri, gi + 1, bi + 1);
        let c100 = self.node(ri + 1, gi, bi);
        let c101 = self.node(ri + 1, gi, bi + 1);
        let c110 = self.node(ri + 1, gi + 1, bi);
        let c111 = self.node(ri + 1, gi + 1, bi + 1);

        let mut result = [0.0f32; 3];
        for i in 0..3 {
            let c00 = c000[i] * (1.0 - rf) + c100[i] * rf;
            let c01 = c001[i] * (1.0 - rf) + c101[i] * rf;
            let c10 = c010[i] * (1.0 - rf) + c110[i] * rf;
            let c11 = c011[i] * (1.0 - rf) + c111[i] * rf;

            let c0 = c00 * (1.0 - gf) + c10 * gf;
            let c1 = c01 * (1.0 - gf) + c11 * gf;

            result[i] = c0 * (1.0 - bf) + c1 * bf;
        }
        result
    }

    fn apply_tetrahedral(&self, rgb: [f32; 3]) -> [f32; 3] {
        let ([ri, gi, bi], [rf, gf, bf]) = self.locate(rgb);

        let c000 = self.node(ri, gi, bi);
        let c111 = self.node(ri + 1, gi + 1, bi + 1);

        // (second vertex, third vertex, t1, t2, t3) with t1 >= t2 >= t3
        let (v1, v2, t1, t2, t3) = if rf > gf {
            if gf > bf {
                (self.node(ri + 1, gi, bi), self.node(ri + 1, gi + 1, bi), rf, gf, bf)
            } else if rf > bf {
                (self.node(ri + 1, gi, bi), self.node(ri + 1, gi, bi + 1), rf, bf, gf)
            } else {
                (self.node(ri, gi, bi + 1), self.node(ri + 1, gi, bi + 1), bf, rf, gf)
            }
        } else if bf > gf {
            (self.node(ri, gi, bi + 1), self.node(ri, gi + 1, bi + 1), bf, gf, rf)
        } else if bf > rf {
            (self.node(ri, gi + 1, bi), self.node(ri, gi + 1, bi + 1), gf, bf, rf)
        } else {
            (self.node(ri, gi + 1, bi), self.node(ri + 1, gi + 1, bi), gf, rf, bf)
        };

        let mut result = [0.0f32; 3];
        for i in 0..3 {
            result[i] = (1.0 - t1) * c000[i] + (t1 - t2) * v1[i] + (t2 - t3) * v2[i] + t3 * c111[i];
        }
        result
    }
}

fn check_grid_size(grid_size: usize) -> LutResult<()> {
    if !(2..=MAX_GRID_SIZE).contains(&grid_size) {
        return Err(LutError::InvalidSize(format!(
            "3D LUT grid size {grid_size} outside [2, {MAX_GRID_SIZE}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn warp(rgb: [f64; 3]) -> [f64; 3] {
        [
            rgb[0] * rgb[0],
            0.2 * rgb[0] + 0.8 * rgb[1],
            (rgb[2] + rgb[1]) * 0.5,
        ]
    }

    #[test]
    fn blue_is_fastest() {
        let lut = Lut3D::identity(3).unwrap();
        assert_eq!(lut.node(0, 0, 1), [0.0, 0.0, 0.5]);
        assert_eq!(&lut.values()[3..6], &[0.0, 0.0, 0.5]);
        assert_eq!(lut.index(1, 0, 0), 27);
    }

    #[test]
    fn identity_all_methods() {
        for interp in [Interpolation::Linear, Interpolation::Tetrahedral] {
            let lut = Lut3D::identity(17).unwrap().with_interpolation(interp);
            let out = lut.apply([0.1, 0.55, 0.93]);
            assert_abs_diff_eq!(out[0], 0.1, epsilon = 1e-6);
            assert_abs_diff_eq!(out[1], 0.55, epsilon = 1e-6);
            assert_abs_diff_eq!(out[2], 0.93, epsilon = 1e-6);
        }
    }

    #[test]
    fn nodes_are_exact() {
        let lut = Lut3D::from_fn(5, warp).unwrap().with_interpolation(Interpolation::Tetrahedral);
        let out = lut.apply([0.25, 0.5, 0.75]);
        let aim = warp([0.25, 0.5, 0.75]);
        for c in 0..3 {
            assert_abs_diff_eq!(out[c], aim[c] as f32, epsilon = 1e-6);
        }
    }

    #[test]
    fn tetrahedral_is_exact_on_affine() {
        let affine = |rgb: [f64; 3]| {
            [0.3 * rgb[0] + 0.5 * rgb[2] + 0.1, rgb[1] * 0.9, rgb[0] - rgb[1] + rgb[2]]
        };
        let lut = Lut3D::from_fn(4, affine).unwrap().with_interpolation(Interpolation::Tetrahedral);
        for rgb in [[0.13f32, 0.71, 0.42], [0.9, 0.2, 0.6], [0.33, 0.33, 0.9]] {
            let out = lut.apply(rgb);
            let aim = affine([rgb[0] as f64, rgb[1] as f64, rgb[2] as f64]);
            for c in 0..3 {
                assert_abs_diff_eq!(out[c], aim[c] as f32, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn clamps_and_nan() {
        let lut = Lut3D::identity(9).unwrap();
        assert_eq!(lut.apply([-1.0, 2.0, f32::NAN]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn size_validation() {
        assert!(matches!(Lut3D::identity(1), Err(LutError::InvalidSize(_))));
        assert!(matches!(Lut3D::identity(130), Err(LutError::InvalidSize(_))));
        assert!(matches!(
            Lut3D::from_values(2, vec![0.0; 23]),
            Err(LutError::DimensionMismatch { expected: 24, actual: 23 })
        ));
    }

    #[test]
    fn alpha_untouched() {
        let lut = Lut3D::from_fn(3, warp).unwrap();
        let mut px = [0.5, 0.5, 0.5, 0.25];
        lut.apply_rgba(&mut px);
        assert_eq!(px[3], 0.25);
    }
}
