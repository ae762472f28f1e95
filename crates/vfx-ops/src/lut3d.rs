//! Lut3D op: an RGB lattice evaluated with trilinear or tetrahedral
//! interpolation.
//!
//! Inputs are clamped to the unit cube before lookup, so a 3D LUT is never
//! a no-op. The inverse direction uses [`InvLut3D`], which searches the
//! forward lattice tetrahedron by tetrahedron, or a lattice baked from it by
//! [`make_fast_inverse_3d`].

use vfx_core::TransformDirection;
use vfx_lut::{Interpolation, InvLut3D, Lut3D, make_fast_inverse_3d};

use crate::lut1d::fingerprint;
use crate::matrix::{MatrixData, MatrixRenderer};
use crate::op_data::OpParams;
use crate::range::RangeData;
use crate::{LutInversionQuality, OpError, OpKind, OpResult};

const IDENTITY_TOLERANCE: f32 = 1e-5;

/// Parameters of a 3D LUT op.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3DData {
    /// Lattice values, blue fastest.
    pub lut: Lut3D,
    /// RGB matrix applied before the lookup.
    pub domain: Option<MatrixData>,
    /// Inversion quality requested for the inverse direction.
    pub inversion: LutInversionQuality,
}

impl Lut3DData {
    /// Wraps a lattice.
    pub fn new(lut: Lut3D) -> Self {
        Self { lut, domain: None, inversion: LutInversionQuality::Default }
    }

    /// Builds the lattice from `3 * grid^3` interleaved values.
    pub fn from_values(grid_size: usize, values: Vec<f32>) -> OpResult<Self> {
        Lut3D::from_values(grid_size, values)
            .map(Self::new)
            .map_err(|e| OpError::from_lut(OpKind::Lut3D, e))
    }

    /// Sets the requested inversion quality.
    pub fn with_inversion(mut self, inversion: LutInversionQuality) -> Self {
        self.inversion = inversion;
        self
    }

    /// Checks the domain prefix; the lattice is checked on construction.
    pub fn validate(&self) -> OpResult<()> {
        if let Some(domain) = &self.domain {
            domain.validate()?;
            if domain.has_alpha() {
                return Err(OpError::ContractViolation("Lut3D domain prefix must not touch alpha".into()));
            }
        }
        Ok(())
    }

    /// Whether every lattice point holds its own coordinates.
    pub fn is_identity(&self) -> bool {
        if self.domain.is_some_and(|d| !d.is_identity()) {
            return false;
        }
        let n = self.lut.grid_size();
        let step = 1.0 / (n - 1) as f32;
        (0..n).all(|r| {
            (0..n).all(|g| {
                (0..n).all(|b| {
                    let v = self.lut.node(r, g, b);
                    let aim = [r as f32 * step, g as f32 * step, b as f32 * step];
                    (0..3).all(|c| (v[c] - aim[c]).abs() <= IDENTITY_TOLERANCE)
                })
            })
        })
    }

    /// Both directions clamp to the unit cube.
    pub fn identity_replacement(&self) -> OpParams {
        OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0))
    }

    /// Same lattice, ignoring the requested inversion quality.
    pub fn same_lattice(&self, other: &Self) -> bool {
        self.lut == other.lut && self.domain == other.domain
    }

    /// Lattice computing `next` after `self`, both forward, at the larger
    /// of the two grids.
    pub fn compose(&self, next: &Self) -> OpResult<Self> {
        if next.domain.is_some() {
            return Err(OpError::ContractViolation("cannot compose into a LUT with a domain prefix".into()));
        }
        let grid = self.lut.grid_size().max(next.lut.grid_size());
        let mut lut = Lut3D::identity(grid).map_err(|e| OpError::from_lut(OpKind::Lut3D, e))?;
        for rgb in lut.values_mut().chunks_exact_mut(3) {
            let out = next.lut.apply(self.lut.apply([rgb[0], rgb[1], rgb[2]]));
            rgb.copy_from_slice(&out);
        }
        let interpolation = if self.lut.interpolation() == Interpolation::Tetrahedral
            || next.lut.interpolation() == Interpolation::Tetrahedral
        {
            Interpolation::Tetrahedral
        } else {
            Interpolation::Linear
        };
        Ok(Self { lut: lut.with_interpolation(interpolation), domain: self.domain, inversion: self.inversion })
    }

    /// Tetrahedral forward lattice approximating the inverse.
    pub fn fast_inverse(&self) -> OpResult<Self> {
        make_fast_inverse_3d(&self.lut)
            .map(Self::new)
            .map_err(|e| OpError::from_lut(OpKind::Lut3D, e))
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!(
            "Lut3D {} {} {}",
            self.lut.grid_size(),
            self.lut.interpolation().as_str(),
            fingerprint(self.lut.values()),
        );
        if let Some(domain) = &self.domain {
            s.push_str(" domain ");
            s.push_str(&domain.cache_id());
        }
        s
    }
}

#[derive(Debug, Clone)]
enum Lookup {
    Forward(Lut3D),
    Inverse(Box<InvLut3D>),
}

/// CPU kernel for a 3D LUT op.
#[derive(Debug, Clone)]
pub struct Lut3DRenderer {
    domain: Option<MatrixRenderer>,
    lookup: Lookup,
}

impl Lut3DRenderer {
    /// Forward lookup, exact inverse search, or a baked inverse when
    /// `fast` is set for the inverse direction.
    pub fn new(data: &Lut3DData, direction: TransformDirection, fast: bool) -> OpResult<Self> {
        let lookup = match direction {
            TransformDirection::Forward => Lookup::Forward(data.lut.clone()),
            TransformDirection::Inverse if fast => Lookup::Forward(data.fast_inverse()?.lut),
            TransformDirection::Inverse => Lookup::Inverse(Box::new(InvLut3D::new(&data.lut))),
        };
        Ok(Self { domain: data.domain.as_ref().map(MatrixRenderer::new), lookup })
    }

    /// Processes packed RGBA pixels in place; alpha is unchanged.
    pub fn apply(&self, pixels: &mut [f32]) {
        if let Some(domain) = &self.domain {
            domain.apply(pixels);
        }
        match &self.lookup {
            Lookup::Forward(lut) => lut.apply_rgba(pixels),
            Lookup::Inverse(inv) => inv.apply_rgba(pixels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn warm(rgb: [f64; 3]) -> [f64; 3] {
        [0.9 * rgb[0] + 0.1 * rgb[1], 0.8 * rgb[1] + 0.1, rgb[2] * rgb[2]]
    }

    fn warm_lut() -> Lut3DData {
        Lut3DData::new(Lut3D::from_fn(17, warm).unwrap().with_interpolation(Interpolation::Tetrahedral))
    }

    #[test]
    fn value_count_is_checked() {
        let err = Lut3DData::from_values(2, vec![0.0; 23]).unwrap_err();
        assert!(matches!(err, OpError::DimensionMismatch { kind: OpKind::Lut3D, actual: 23, .. }));
    }

    #[test]
    fn identity_detection() {
        assert!(Lut3DData::new(Lut3D::identity(5).unwrap()).is_identity());
        assert!(!warm_lut().is_identity());
        let mut scaled = Lut3DData::new(Lut3D::identity(5).unwrap());
        scaled.domain = Some(MatrixData::scale([0.5, 0.5, 0.5, 1.0]));
        assert!(!scaled.is_identity());
    }

    #[test]
    fn compose_uses_larger_grid() {
        let small = Lut3DData::new(Lut3D::from_fn(2, |c| c.map(|v| 0.5 * v)).unwrap());
        let out = small.compose(&warm_lut()).unwrap();
        assert_eq!(out.lut.grid_size(), 17);
        assert_eq!(out.lut.interpolation(), Interpolation::Tetrahedral);
        let got = out.lut.apply([1.0, 1.0, 1.0]);
        let aim = warm([0.5, 0.5, 0.5]);
        for c in 0..3 {
            assert_abs_diff_eq!(got[c], aim[c] as f32, epsilon = 1e-5);
        }
    }

    #[test]
    fn exact_inverse_roundtrips() {
        let data = warm_lut();
        let fwd = Lut3DRenderer::new(&data, TransformDirection::Forward, false).unwrap();
        let inv = Lut3DRenderer::new(&data, TransformDirection::Inverse, false).unwrap();
        let mut px = [0.3, 0.6, 0.7, 0.5, 0.9, 0.1, 0.4, 1.0];
        let src = px;
        fwd.apply(&mut px);
        inv.apply(&mut px);
        for (a, b) in px.iter().zip(&src) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn fast_inverse_is_tetrahedral() {
        let inv = warm_lut().fast_inverse().unwrap();
        assert_eq!(inv.lut.interpolation(), Interpolation::Tetrahedral);
        assert!(inv.lut.grid_size() >= 48);
        let y = warm([0.4, 0.5, 0.6]).map(|v| v as f32);
        let x = inv.lut.apply(y);
        assert_abs_diff_eq!(x[0], 0.4, epsilon = 1.5e-2);
        assert_abs_diff_eq!(x[1], 0.5, epsilon = 1.5e-2);
        assert_abs_diff_eq!(x[2], 0.6, epsilon = 1.5e-2);
    }

    #[test]
    fn domain_prefix_may_cross_channels() {
        let mut data = Lut3DData::new(Lut3D::identity(2).unwrap());
        data.domain = Some(MatrixData::from_slice(&[0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap());
        data.validate().unwrap();
        let mut px = [0.2, 0.7, 0.1, 1.0];
        Lut3DRenderer::new(&data, TransformDirection::Forward, false).unwrap().apply(&mut px);
        assert_abs_diff_eq!(px[0], 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 0.2, epsilon = 1e-6);
    }
}
