//! 4x4 RGBA matrix.
//!
//! [`Mat4`] backs the Matrix op: RGB and alpha each have a row and a column,
//! so alpha participates in the product like any other channel.
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::Mat4;
//!
//! let m = Mat4::from_mat3([[1.0, 0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
//! let out = m.mul_vec4([1.0, 2.0, 3.0, 1.0]);
//! assert_eq!(out, [2.0, 2.0, 3.0, 1.0]);
//! ```

use std::ops::Mul;

/// A double-precision, row-major 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// Elements in row-major order.
    pub m: [f64; 16],
}

impl Mat4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Creates from 16 row-major values.
    #[inline]
    pub const fn from_row_array(m: [f64; 16]) -> Self {
        Self { m }
    }

    /// Diagonal matrix.
    pub const fn diagonal(d: [f64; 4]) -> Self {
        Self {
            m: [
                d[0], 0.0, 0.0, 0.0, //
                0.0, d[1], 0.0, 0.0, //
                0.0, 0.0, d[2], 0.0, //
                0.0, 0.0, 0.0, d[3],
            ],
        }
    }

    /// Embeds a 3x3 RGB matrix; alpha passes through.
    pub const fn from_mat3(r: [[f64; 3]; 3]) -> Self {
        Self {
            m: [
                r[0][0], r[0][1], r[0][2], 0.0, //
                r[1][0], r[1][1], r[1][2], 0.0, //
                r[2][0], r[2][1], r[2][2], 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Element at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row * 4 + col]
    }

    /// Sets element at (row, col).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: f64) {
        self.m[row * 4 + col] = v;
    }

    /// Diagonal values.
    pub fn diag(&self) -> [f64; 4] {
        [self.m[0], self.m[5], self.m[10], self.m[15]]
    }

    /// Largest absolute element.
    pub fn max_abs(&self) -> f64 {
        self.m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Matrix-vector product.
    #[inline]
    pub fn mul_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.m;
        [
            m[0] * v[0] + m[1] * v[1] + m[2] * v[2] + m[3] * v[3],
            m[4] * v[0] + m[5] * v[1] + m[6] * v[2] + m[7] * v[3],
            m[8] * v[0] + m[9] * v[1] + m[10] * v[2] + m[11] * v[3],
            m[12] * v[0] + m[13] * v[1] + m[14] * v[2] + m[15] * v[3],
        ]
    }

    /// Matrix product `self * rhs` (rhs is applied first).
    pub fn mul_mat(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for r in 0..4 {
            for c in 0..4 {
                out[r * 4 + c] = (0..4).map(|k| self.m[r * 4 + k] * rhs.m[k * 4 + c]).sum();
            }
        }
        Self { m: out }
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        let mut out = [0.0; 16];
        for r in 0..4 {
            for c in 0..4 {
                out[c * 4 + r] = self.m[r * 4 + c];
            }
        }
        Self { m: out }
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` when a pivot vanishes relative to the largest element.
    pub fn inverse(&self) -> Option<Self> {
        let scale = self.max_abs();
        if scale == 0.0 || !scale.is_finite() {
            return None;
        }
        let eps = scale * 1e-13;

        let mut a = self.m;
        let mut inv = Self::IDENTITY.m;

        for col in 0..4 {
            let mut pivot = col;
            let mut best = a[col * 4 + col].abs();
            for row in col + 1..4 {
                let v = a[row * 4 + col].abs();
                if v > best {
                    best = v;
                    pivot = row;
                }
            }
            if best <= eps {
                return None;
            }

            if pivot != col {
                for k in 0..4 {
                    a.swap(col * 4 + k, pivot * 4 + k);
                    inv.swap(col * 4 + k, pivot * 4 + k);
                }
            }

            let p = a[col * 4 + col];
            for k in 0..4 {
                a[col * 4 + k] /= p;
                inv[col * 4 + k] /= p;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let f = a[row * 4 + col];
                if f == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row * 4 + k] -= f * a[col * 4 + k];
                    inv[row * 4 + k] -= f * inv[col * 4 + k];
                }
            }
        }

        Some(Self { m: inv })
    }

    /// Converts to glam (column-major).
    pub fn to_glam(&self) -> glam::DMat4 {
        glam::DMat4::from_cols_array(&self.transpose().m)
    }

    /// Single-precision copy for renderers.
    pub fn to_f32(&self) -> [f32; 16] {
        self.m.map(|v| v as f32)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.mul_mat(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gauss_jordan_inverse() {
        let m = Mat4::from_row_array([
            0.0, 2.0, 0.0, 1.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.5, 3.0, 0.0, //
            0.0, 0.0, 0.0, 2.0,
        ]);
        let inv = m.inverse().unwrap();
        let id = m * inv;
        for i in 0..16 {
            assert_abs_diff_eq!(id.m[i], Mat4::IDENTITY.m[i], epsilon = 1e-14);
        }
    }

    #[test]
    fn singular() {
        let mut m = Mat4::IDENTITY;
        m.set(2, 2, 0.0);
        assert!(m.inverse().is_none());
        assert!(Mat4::diagonal([0.0; 4]).inverse().is_none());
    }

    #[test]
    fn matches_glam() {
        let m = Mat4::from_row_array([
            1.0, 2.0, 0.0, 0.0, //
            0.0, 1.0, 3.0, 0.0, //
            4.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        let v = [0.1, 0.2, 0.3, 1.0];
        let ours = m.mul_vec4(v);
        let theirs = m.to_glam() * glam::DVec4::from_array(v);
        for i in 0..4 {
            assert_abs_diff_eq!(ours[i], theirs.to_array()[i], epsilon = 1e-15);
        }
    }
}
