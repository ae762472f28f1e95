//! Inversion of 3D LUTs.
//!
//! The forward LUT is treated as a tetrahedral mesh: every lattice cell is
//! split into the same 6 tetrahedra the forward kernel uses. Inverting a
//! target colour means finding a tetrahedron whose image contains it and
//! solving for its barycentric coordinates.
//!
//! # Algorithm
//!
//! 1. The lattice is padded by one node on every side. Padding nodes copy the
//!    nearest boundary node pushed away from mid-grey, `(v - 0.5) * 4 + 0.5`,
//!    so targets slightly outside the forward gamut still fall in a cell.
//! 2. A range tree of axis-aligned bounds over cell images (2x2x2 children per
//!    node) prunes the search.
//! 3. Cells are visited in fixed `r, g, b` order, blue fastest; the first
//!    tetrahedron that contains the target wins, so non-injective LUTs always
//!    return the same pre-image.
//! 4. The solution is mapped back to the unpadded grid and clamped to [0, 1],
//!    which projects out-of-gamut targets onto the boundary.
//!
//! When no tetrahedron contains the target, the nearest lattice node (in
//! output space) is used instead.
//!
//! ```rust
//! use vfx_lut::{InvLut3D, Lut3D};
//!
//! let fwd = Lut3D::from_fn(9, |[r, g, b]| [r * 0.5, g, (b + r) * 0.5]).unwrap();
//! let inv = InvLut3D::new(&fwd);
//! let x = inv.eval([0.2, 0.6, 0.3]);
//! assert!((x[0] - 0.4).abs() < 1e-4);
//! ```

use crate::{Interpolation, Lut3D, LutResult};
use vfx_math::{Mat3, Vec3};

/// Centre of the padding extrapolation.
const PAD_CENTER: f32 = 0.5;
/// Scale of the padding extrapolation.
const PAD_SCALE: f32 = 4.0;
/// Slack on barycentric and bounding-box tests.
const EPS: f64 = 1e-6;

/// Smallest grid of a baked inverse.
pub const FAST_INVERSE_MIN_GRID: usize = 48;
/// Largest grid of a baked inverse.
pub const FAST_INVERSE_MAX_GRID: usize = 64;

/// Axis order of the 6 tetrahedra, in search order.
///
/// Entry `[a, b, c]` walks `c000 -> +a -> +b -> +c = c111`.
const TETRAHEDRA: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [2, 0, 1],
    [2, 1, 0],
    [1, 2, 0],
    [1, 0, 2],
];

#[derive(Debug, Clone)]
struct Level {
    dims: [usize; 3],
    lo: Vec<[f32; 3]>,
    hi: Vec<[f32; 3]>,
}

impl Level {
    #[inline]
    fn at(&self, i: [usize; 3]) -> usize {
        (i[0] * self.dims[1] + i[1]) * self.dims[2] + i[2]
    }

    fn contains(&self, i: [usize; 3], p: [f32; 3]) -> bool {
        let k = self.at(i);
        let (lo, hi) = (self.lo[k], self.hi[k]);
        (0..3).all(|c| p[c] >= lo[c] && p[c] <= hi[c])
    }
}

/// Exact inverse of a 3D LUT.
#[derive(Debug, Clone)]
pub struct InvLut3D {
    /// Padded lattice, `(dim + 2)^3` nodes, blue fastest.
    nodes: Vec<[f32; 3]>,
    /// Nodes per axis of the padded lattice.
    ext: usize,
    /// Grid size of the forward LUT.
    dim: usize,
    /// Level 0 holds cells; the last level is the root.
    levels: Vec<Level>,
}

impl InvLut3D {
    /// Builds the padded lattice and search tree for `forward`.
    pub fn new(forward: &Lut3D) -> Self {
        let dim = forward.grid_size();
        let ext = dim + 2;
        let mut nodes = Vec::with_capacity(ext * ext * ext);
        for i in 0..ext {
            for j in 0..ext {
                for k in 0..ext {
                    let src = |x: usize| x.saturating_sub(1).min(dim - 1);
                    let v = forward.node(src(i), src(j), src(k));
                    let outer = [i, j, k].iter().any(|&x| x == 0 || x == ext - 1);
                    nodes.push(if outer { v.map(|c| (c - PAD_CENTER) * PAD_SCALE + PAD_CENTER) } else { v });
                }
            }
        }
        let levels = build_levels(&nodes, ext);
        Self { nodes, ext, dim, levels }
    }

    #[inline]
    fn node(&self, i: usize, j: usize, k: usize) -> [f32; 3] {
        self.nodes[(i * self.ext + j) * self.ext + k]
    }

    /// Inverts one RGB value. Input is clamped to [0, 1]; NaN reads as 0.
    pub fn eval(&self, rgb: [f32; 3]) -> [f32; 3] {
        let target = rgb.map(|v| v.max(0.0).min(1.0));
        let coords = self
            .search(self.levels.len() - 1, [0, 0, 0], target)
            .unwrap_or_else(|| self.nearest_node(target));

        let max = (self.dim - 1) as f64;
        coords.map(|x| ((x - 1.0).clamp(0.0, max) / max) as f32)
    }

    /// Inverts packed RGBA pixels in place; alpha passes through.
    pub fn apply_rgba(&self, pixels: &mut [f32]) {
        for px in pixels.chunks_exact_mut(4) {
            let out = self.eval([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }

    /// Depth-first search from node `at` of `level`. Returns padded-grid
    /// coordinates of a pre-image.
    fn search(&self, level: usize, at: [usize; 3], p: [f32; 3]) -> Option<[f64; 3]> {
        let lvl = &self.levels[level];
        if !lvl.contains(at, p) {
            return None;
        }
        if level == 0 {
            return self.solve_cell(at, p);
        }
        let child_dims = self.levels[level - 1].dims;
        for i in 2 * at[0]..(2 * at[0] + 2).min(child_dims[0]) {
            for j in 2 * at[1]..(2 * at[1] + 2).min(child_dims[1]) {
                for k in 2 * at[2]..(2 * at[2] + 2).min(child_dims[2]) {
                    if let Some(x) = self.search(level - 1, [i, j, k], p) {
                        return Some(x);
                    }
                }
            }
        }
        None
    }

    /// Tests the 6 tetrahedra of cell `base`.
    fn solve_cell(&self, base: [usize; 3], p: [f32; 3]) -> Option<[f64; 3]> {
        let vec = |n: [f32; 3]| Vec3::new(n[0] as f64, n[1] as f64, n[2] as f64);
        let at = |off: [usize; 3]| {
            vec(self.node(base[0] + off[0], base[1] + off[1], base[2] + off[2]))
        };
        let c000 = at([0, 0, 0]);
        let c111 = at([1, 1, 1]);
        let rhs = vec(p) - c000;

        for axes in TETRAHEDRA {
            let mut o1 = [0usize; 3];
            o1[axes[0]] = 1;
            let mut o2 = o1;
            o2[axes[1]] = 1;
            let v1 = at(o1);
            let v2 = at(o2);

            let m = Mat3::from_col_vecs(v1 - c000, v2 - v1, c111 - v2);
            let Some(inv) = m.inverse() else { continue };
            let t = inv * rhs;
            let (t1, t2, t3) = (t.x, t.y, t.z);
            if t1 <= 1.0 + EPS && t1 >= t2 - EPS && t2 >= t3 - EPS && t3 >= -EPS {
                let mut x = [base[0] as f64, base[1] as f64, base[2] as f64];
                x[axes[0]] += t1.clamp(0.0, 1.0);
                x[axes[1]] += t2.clamp(0.0, 1.0);
                x[axes[2]] += t3.clamp(0.0, 1.0);
                return Some(x);
            }
        }
        None
    }

    /// Padded-grid coordinates of the node closest to `p`, first in scan
    /// order on ties.
    fn nearest_node(&self, p: [f32; 3]) -> [f64; 3] {
        let mut best = (f32::INFINITY, 0usize);
        for (n, v) in self.nodes.iter().enumerate() {
            let d: f32 = (0..3).map(|c| (v[c] - p[c]) * (v[c] - p[c])).sum();
            if d < best.0 {
                best = (d, n);
            }
        }
        let n = best.1;
        let e = self.ext;
        [(n / (e * e)) as f64, ((n / e) % e) as f64, (n % e) as f64]
    }
}

fn build_levels(nodes: &[[f32; 3]], ext: usize) -> Vec<Level> {
    let cells = ext - 1;
    let mut leaf = Level {
        dims: [cells; 3],
        lo: Vec::with_capacity(cells * cells * cells),
        hi: Vec::with_capacity(cells * cells * cells),
    };
    for i in 0..cells {
        for j in 0..cells {
            for k in 0..cells {
                let mut lo = [f32::INFINITY; 3];
                let mut hi = [f32::NEG_INFINITY; 3];
                for (di, dj, dk) in CORNERS {
                    let v = nodes[((i + di) * ext + j + dj) * ext + k + dk];
                    for c in 0..3 {
                        lo[c] = lo[c].min(v[c]);
                        hi[c] = hi[c].max(v[c]);
                    }
                }
                leaf.lo.push(lo.map(|x| x - EPS as f32));
                leaf.hi.push(hi.map(|x| x + EPS as f32));
            }
        }
    }

    let mut levels = vec![leaf];
    while levels[levels.len() - 1].dims.iter().any(|&d| d > 1) {
        let child = &levels[levels.len() - 1];
        let dims = child.dims.map(|d| d.div_ceil(2));
        let count = dims[0] * dims[1] * dims[2];
        let mut parent = Level {
            dims,
            lo: vec![[f32::INFINITY; 3]; count],
            hi: vec![[f32::NEG_INFINITY; 3]; count],
        };
        for i in 0..child.dims[0] {
            for j in 0..child.dims[1] {
                for k in 0..child.dims[2] {
                    let src = child.at([i, j, k]);
                    let dst = parent.at([i / 2, j / 2, k / 2]);
                    for c in 0..3 {
                        parent.lo[dst][c] = parent.lo[dst][c].min(child.lo[src][c]);
                        parent.hi[dst][c] = parent.hi[dst][c].max(child.hi[src][c]);
                    }
                }
            }
        }
        levels.push(parent);
    }
    levels
}

const CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (0, 0, 1),
    (0, 1, 0),
    (0, 1, 1),
    (1, 0, 0),
    (1, 0, 1),
    (1, 1, 0),
    (1, 1, 1),
];

/// Grid size used to bake the inverse of a LUT with `forward_grid` points.
pub fn fast_inverse_grid(forward_grid: usize) -> usize {
    forward_grid.clamp(FAST_INVERSE_MIN_GRID, FAST_INVERSE_MAX_GRID)
}

/// Bakes the exact inverse of `forward` into a tetrahedral forward LUT.
pub fn make_fast_inverse_3d(forward: &Lut3D) -> LutResult<Lut3D> {
    let inv = InvLut3D::new(forward);
    let grid = fast_inverse_grid(forward.grid_size());
    let lut = Lut3D::from_fn(grid, |rgb| {
        inv.eval(rgb.map(|v| v as f32)).map(|v| v as f64)
    })?;
    Ok(lut.with_interpolation(Interpolation::Tetrahedral))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn smooth(rgb: [f64; 3]) -> [f64; 3] {
        [
            rgb[0].powf(1.5) * 0.9 + 0.05 * rgb[1],
            rgb[1].sqrt() * 0.8 + 0.1 * rgb[2],
            0.7 * rgb[2] + 0.2 * rgb[0] * rgb[1],
        ]
    }

    #[test]
    fn tree_reaches_single_root() {
        let inv = InvLut3D::new(&Lut3D::identity(5).unwrap());
        assert_eq!(inv.levels[0].dims, [6, 6, 6]);
        assert_eq!(inv.levels.last().map(|l| l.dims), Some([1, 1, 1]));
    }

    #[test]
    fn padding_extrapolates_boundary() {
        let inv = InvLut3D::new(&Lut3D::identity(3).unwrap());
        assert_eq!(inv.node(0, 2, 2), [-1.5, 0.5, 0.5]);
        assert_eq!(inv.node(2, 2, 2), [0.5, 0.5, 0.5]);
        assert_eq!(inv.node(4, 4, 4), [2.5, 2.5, 2.5]);
    }

    #[test]
    fn identity_inverse() {
        let inv = InvLut3D::new(&Lut3D::identity(17).unwrap());
        for rgb in [[0.0f32, 0.0, 0.0], [0.25, 0.5, 0.75], [1.0, 1.0, 1.0], [0.91, 0.03, 0.5]] {
            let x = inv.eval(rgb);
            for c in 0..3 {
                assert_abs_diff_eq!(x[c], rgb[c], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn roundtrips_through_tetrahedral_forward() {
        let fwd = Lut3D::from_fn(17, smooth).unwrap().with_interpolation(Interpolation::Tetrahedral);
        let inv = InvLut3D::new(&fwd);
        for rgb in [[0.2f32, 0.4, 0.6], [0.8, 0.1, 0.3], [0.5, 0.5, 0.5], [0.3, 0.7, 0.6]] {
            let y = fwd.apply(rgb);
            let back = fwd.apply(inv.eval(y));
            for c in 0..3 {
                assert_abs_diff_eq!(back[c], y[c], epsilon = 3e-6);
            }
        }
    }

    #[test]
    fn out_of_gamut_projects_into_domain() {
        // forward image is [0.25, 0.75]^3, so 0 and 1 lie outside it
        let fwd = Lut3D::from_fn(9, |rgb| rgb.map(|v| 0.25 + 0.5 * v)).unwrap();
        let inv = InvLut3D::new(&fwd);
        for (target, aim) in [(0.0f32, 0.0f32), (1.0, 1.0), (0.5, 0.5)] {
            let x = inv.eval([target; 3]);
            for c in 0..3 {
                assert_abs_diff_eq!(x[c], aim, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn constant_lut_still_answers() {
        let fwd = Lut3D::from_fn(3, |_| [0.5, 0.5, 0.5]).unwrap();
        let inv = InvLut3D::new(&fwd);
        let x = inv.eval([0.1, 0.9, 0.4]);
        assert!(x.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(x, inv.eval([0.1, 0.9, 0.4]));
    }

    #[test]
    fn fast_inverse_grid_bounds() {
        assert_eq!(fast_inverse_grid(17), 48);
        assert_eq!(fast_inverse_grid(55), 55);
        assert_eq!(fast_inverse_grid(129), 64);
    }

    #[test]
    fn fast_inverse_close_to_exact() {
        let fwd = Lut3D::from_fn(17, smooth).unwrap().with_interpolation(Interpolation::Tetrahedral);
        let fast = make_fast_inverse_3d(&fwd).unwrap();
        assert_eq!(fast.grid_size(), 48);
        for rgb in [[0.2f32, 0.4, 0.6], [0.7, 0.3, 0.5]] {
            let y = fwd.apply(rgb);
            let x = fast.apply(y);
            for c in 0..3 {
                assert_abs_diff_eq!(x[c], rgb[c], epsilon = 1.5e-2);
            }
        }
    }
}
