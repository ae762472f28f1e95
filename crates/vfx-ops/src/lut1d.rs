//! Lut1D op: per-channel curves sampled on a grid or on every half code.
//!
//! The LUT array itself lives in [`vfx_lut::Lut1D`]; this module adds the
//! op-level behavior around it:
//!
//! - an optional domain prefix, a diagonal matrix the optimizer folds in
//!   from a preceding op and applies to each pixel before the lookup
//! - the inversion quality requested by the caller
//! - identity tests, composition and content fingerprints
//!
//! The inverse direction is carried by the op, not by this record. An
//! inverse LUT is either searched per pixel ([`InvLut1D`]) or baked into a
//! forward LUT once ([`make_fast_inverse`]).

use sha2::{Digest, Sha256};
use vfx_core::{BitDepth, TransformDirection};
use vfx_lut::{InvLut1D, Lut1D, make_fast_inverse};

use crate::matrix::{MatrixData, MatrixRenderer};
use crate::op_data::OpParams;
use crate::range::RangeData;
use crate::{LutInversionQuality, OpError, OpKind, OpResult};

/// Parameters of a 1D LUT op.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1DData {
    /// Sampled curves.
    pub lut: Lut1D,
    /// Diagonal matrix applied before the lookup.
    pub domain: Option<MatrixData>,
    /// Inversion quality requested for the inverse direction.
    pub inversion: LutInversionQuality,
}

impl Lut1DData {
    /// Wraps a LUT array.
    pub fn new(lut: Lut1D) -> Self {
        Self { lut, domain: None, inversion: LutInversionQuality::Default }
    }

    /// Builds the array from interleaved RGB values.
    pub fn from_values(values: Vec<f32>, half_domain: bool) -> OpResult<Self> {
        Lut1D::from_values(values, half_domain)
            .map(Self::new)
            .map_err(|e| OpError::from_lut(OpKind::Lut1D, e))
    }

    /// Sets the requested inversion quality.
    pub fn with_inversion(mut self, inversion: LutInversionQuality) -> Self {
        self.inversion = inversion;
        self
    }

    /// Checks the domain prefix; the array is checked on construction.
    pub fn validate(&self) -> OpResult<()> {
        if let Some(domain) = &self.domain {
            domain.validate()?;
            if !domain.is_diagonal() || domain.has_alpha() {
                return Err(OpError::ContractViolation(
                    "Lut1D domain prefix must be a diagonal RGB matrix".into(),
                ));
            }
        }
        Ok(())
    }

    /// Whether the curves reproduce their input.
    ///
    /// A standard-domain identity still clamps to [0, 1].
    pub fn is_identity(&self) -> bool {
        self.domain.is_none_or(|d| d.is_identity()) && self.lut.is_identity()
    }

    /// Only a half-domain identity leaves every value untouched.
    pub fn is_no_op(&self) -> bool {
        self.lut.is_half_domain() && self.is_identity()
    }

    /// Clamp left behind when the LUT cancels against its inverse.
    ///
    /// A forward LUT clamps its input to [0, 1]; an inverse LUT clamps to
    /// the range of values the forward LUT produces.
    pub fn identity_replacement(&self, direction: TransformDirection) -> OpParams {
        if self.lut.is_half_domain() {
            return OpParams::Matrix(MatrixData::identity());
        }
        if direction.is_forward() {
            return OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0));
        }
        let (lo, hi) = self
            .lut
            .values()
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v as f64), hi.max(v as f64)));
        if lo < hi {
            OpParams::Range(RangeData::new(lo, hi, lo, hi))
        } else {
            OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0))
        }
    }

    /// Same curves, ignoring the requested inversion quality.
    pub fn same_curves(&self, other: &Self) -> bool {
        self.lut == other.lut && self.domain == other.domain
    }

    /// LUT computing `next` after `self`, both forward.
    ///
    /// The result keeps `self`'s domain, resampled to at least `next`'s
    /// length on a standard domain so `next` keeps its resolution.
    pub fn compose(&self, next: &Self) -> OpResult<Self> {
        if next.domain.is_some() {
            return Err(OpError::ContractViolation("cannot compose into a LUT with a domain prefix".into()));
        }
        let mut first = self.lut.clone();
        if !first.is_half_domain() && first.len() < next.lut.len() {
            first = Lut1D::identity(next.lut.len())
                .and_then(|mut grid| {
                    let mut px = grid.to_rgba();
                    self.lut.apply_rgba(&mut px);
                    grid.store_rgba(&px)?;
                    Ok(grid)
                })
                .map_err(|e| OpError::from_lut(OpKind::Lut1D, e))?;
        }
        let mut px = first.to_rgba();
        next.lut.apply_rgba(&mut px);
        first.store_rgba(&px).map_err(|e| OpError::from_lut(OpKind::Lut1D, e))?;
        Ok(Self { lut: first, domain: self.domain, inversion: self.inversion })
    }

    /// Forward LUT approximating the inverse, at a resolution set by
    /// `file_out_depth`.
    pub fn fast_inverse(&self, file_out_depth: BitDepth) -> Self {
        Self::new(make_fast_inverse(&self.lut, file_out_depth))
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!(
            "Lut1D {} {} {}{} {}",
            self.lut.len(),
            self.lut.interpolation().as_str(),
            if self.lut.is_half_domain() { "half" } else { "std" },
            if self.lut.raw_halfs() { " raw" } else { "" },
            fingerprint(self.lut.values()),
        );
        if let Some(domain) = &self.domain {
            s.push_str(" domain ");
            s.push_str(&domain.cache_id());
        }
        s
    }
}

/// SHA-256 of the raw bytes of a value array, hex encoded.
pub(crate) fn fingerprint(values: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for v in values {
        hasher.update(v.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone)]
enum Lookup {
    Forward(Lut1D),
    Inverse(Box<InvLut1D>),
}

/// CPU kernel for a 1D LUT op.
#[derive(Debug, Clone)]
pub struct Lut1DRenderer {
    domain: Option<MatrixRenderer>,
    lookup: Lookup,
}

impl Lut1DRenderer {
    /// Forward lookup, exact inverse search, or a baked inverse when
    /// `fast` is set for the inverse direction.
    /// `file_in_depth` picks the domain of the baked inverse, as the
    /// optimizer's bake does.
    pub fn new(data: &Lut1DData, direction: TransformDirection, fast: bool, file_in_depth: BitDepth) -> Self {
        let lookup = match direction {
            TransformDirection::Forward => Lookup::Forward(data.lut.clone()),
            TransformDirection::Inverse if fast => Lookup::Forward(make_fast_inverse(&data.lut, file_in_depth)),
            TransformDirection::Inverse => Lookup::Inverse(Box::new(InvLut1D::new(&data.lut))),
        };
        Self { domain: data.domain.as_ref().map(MatrixRenderer::new), lookup }
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

    fn square() -> Lut1DData {
        Lut1DData::new(Lut1D::from_fn(1024, |x| x * x).unwrap())
    }

    #[test]
    fn size_errors_name_the_kind() {
        let err = Lut1DData::from_values(vec![0.0; 3], false).unwrap_err();
        assert!(matches!(err, OpError::InvalidParameter { kind: OpKind::Lut1D, .. }));
        let err = Lut1DData::from_values(vec![0.0; 7], false).unwrap_err();
        assert!(matches!(err, OpError::DimensionMismatch { kind: OpKind::Lut1D, .. }));
    }

    #[test]
    fn identity_and_no_op() {
        let std = Lut1DData::new(Lut1D::identity(64).unwrap());
        assert!(std.is_identity());
        assert!(!std.is_no_op());
        assert!(matches!(
            std.identity_replacement(TransformDirection::Forward),
            OpParams::Range(r) if r == RangeData::new(0.0, 1.0, 0.0, 1.0)
        ));

        let half = Lut1DData::new(Lut1D::identity_half());
        assert!(half.is_no_op());
        assert!(matches!(half.identity_replacement(TransformDirection::Inverse), OpParams::Matrix(_)));
    }

    #[test]
    fn inverse_replacement_spans_output() {
        let lut = Lut1DData::new(Lut1D::from_fn(16, |x| 0.1 + 0.5 * x).unwrap());
        let OpParams::Range(r) = lut.identity_replacement(TransformDirection::Inverse) else {
            panic!("expected a range");
        };
        assert_abs_diff_eq!(r.min_in.unwrap(), 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(r.max_in.unwrap(), 0.6, epsilon = 1e-6);
    }

    #[test]
    fn compose_resamples_to_finer_grid() {
        let coarse = Lut1DData::new(Lut1D::from_fn(2, |x| 0.5 * x).unwrap());
        let fine = square();
        let out = coarse.compose(&fine).unwrap();
        assert_eq!(out.lut.len(), 1024);
        assert_abs_diff_eq!(out.lut.eval(0, 0.8), 0.16, epsilon = 1e-4);
    }

    #[test]
    fn renderer_directions() {
        let data = square();
        let mut px = [0.5, 0.25, 0.9, 0.3];
        Lut1DRenderer::new(&data, TransformDirection::Forward, false, BitDepth::Unknown).apply(&mut px);
        assert_abs_diff_eq!(px[0], 0.25, epsilon = 1e-5);
        Lut1DRenderer::new(&data, TransformDirection::Inverse, false, BitDepth::Unknown).apply(&mut px);
        assert_abs_diff_eq!(px[0], 0.5, epsilon = 3e-6);
        assert_abs_diff_eq!(px[1], 0.25, epsilon = 3e-6);
        assert_eq!(px[3], 0.3);

        let mut fast = [0.25, 0.81, 0.0, 1.0];
        Lut1DRenderer::new(&data, TransformDirection::Inverse, true, BitDepth::Unknown).apply(&mut fast);
        assert_abs_diff_eq!(fast[0], 0.5, epsilon = 1.5e-2);
        assert_abs_diff_eq!(fast[1], 0.9, epsilon = 1.5e-2);
    }

    #[test]
    fn domain_prefix_runs_first() {
        let mut data = square();
        data.domain = Some(MatrixData::scale([0.5, 0.5, 0.5, 1.0]));
        data.validate().unwrap();
        let mut px = [1.0, 0.0, 0.0, 1.0];
        Lut1DRenderer::new(&data, TransformDirection::Forward, false, BitDepth::Unknown).apply(&mut px);
        assert_abs_diff_eq!(px[0], 0.25, epsilon = 1e-5);

        data.domain = Some(MatrixData::from_slice(&[1.0, 0.1, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap());
        assert!(data.validate().is_err());
    }

    #[test]
    fn nan_samples_domain_start() {
        let data = Lut1DData::new(Lut1D::from_fn(16, |x| 0.2 + x).unwrap());
        let mut px = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1.0];
        Lut1DRenderer::new(&data, TransformDirection::Forward, false, BitDepth::Unknown).apply(&mut px);
        assert_abs_diff_eq!(px[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 1.2, epsilon = 1e-6);
        assert_abs_diff_eq!(px[2], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn fingerprint_tracks_values() {
        let a = square();
        let mut b = square();
        b.lut.values_mut()[30] += 1e-4;
        assert_ne!(a.cache_id(), b.cache_id());
        assert_eq!(a.cache_id(), square().cache_id());
    }
}
