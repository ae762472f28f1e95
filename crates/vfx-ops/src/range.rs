//! Range op: affine scale with clamping on RGB.
//!
//! A range is given by four optional bounds. Missing bounds leave that side
//! unclamped. When both sides are present the scale and offset are the
//! linear fit between them:
//!
//! ```text
//! scale  = (maxOut - minOut) / (maxIn - minIn)
//! offset = minOut - scale * minIn
//! out    = clamp(in * scale + offset, minOut, maxOut)
//! ```
//!
//! Alpha is never touched. A range always clamps, so it is never a no-op even
//! when scale is one and offset zero.

use vfx_core::format_sig7;

use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::{OpError, OpKind, OpResult};

/// Parameters of a range op.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeData {
    /// Lower input bound.
    pub min_in: Option<f64>,
    /// Upper input bound.
    pub max_in: Option<f64>,
    /// Lower output bound.
    pub min_out: Option<f64>,
    /// Upper output bound.
    pub max_out: Option<f64>,
}

impl RangeData {
    /// Fully bounded range.
    pub const fn new(min_in: f64, max_in: f64, min_out: f64, max_out: f64) -> Self {
        Self { min_in: Some(min_in), max_in: Some(max_in), min_out: Some(min_out), max_out: Some(max_out) }
    }

    /// Range from optional bounds.
    pub const fn from_bounds(
        min_in: Option<f64>,
        max_in: Option<f64>,
        min_out: Option<f64>,
        max_out: Option<f64>,
    ) -> Self {
        Self { min_in, max_in, min_out, max_out }
    }

    /// Clamps negative values to zero; the upper side is open.
    pub const fn clamp_negatives() -> Self {
        Self::from_bounds(Some(0.0), None, Some(0.0), None)
    }

    /// Lower clamp at `min` with no scaling.
    pub const fn lower_clamp(min: f64) -> Self {
        Self::from_bounds(Some(min), None, Some(min), None)
    }

    /// Output is always `value`.
    pub const fn constant(value: f64) -> Self {
        Self::new(0.0, 1.0, value, value)
    }

    /// Checks bound pairing, ordering and finiteness.
    pub fn validate(&self) -> OpResult<()> {
        let named = [
            ("minInValue", self.min_in),
            ("maxInValue", self.max_in),
            ("minOutValue", self.min_out),
            ("maxOutValue", self.max_out),
        ];
        for (name, v) in named {
            if let Some(v) = v
                && !v.is_finite()
            {
                return Err(OpError::invalid(OpKind::Range, name, v, "must be finite"));
            }
        }

        if self.min_in.is_some() != self.min_out.is_some() {
            return Err(OpError::InvalidParameter {
                kind: OpKind::Range,
                param: "minOutValue".into(),
                value: opt_str(self.min_out),
                reason: "minInValue and minOutValue must both be set or both be empty".into(),
            });
        }
        if self.max_in.is_some() != self.max_out.is_some() {
            return Err(OpError::InvalidParameter {
                kind: OpKind::Range,
                param: "maxOutValue".into(),
                value: opt_str(self.max_out),
                reason: "maxInValue and maxOutValue must both be set or both be empty".into(),
            });
        }
        if !self.has_min() && !self.has_max() {
            return Err(OpError::InvalidParameter {
                kind: OpKind::Range,
                param: "bounds".into(),
                value: "empty".into(),
                reason: "at least one side must be set".into(),
            });
        }

        match (self.min_in, self.max_in, self.min_out, self.max_out) {
            (Some(lo_in), Some(hi_in), Some(lo_out), Some(hi_out)) => {
                if lo_in >= hi_in {
                    return Err(OpError::invalid(
                        OpKind::Range,
                        "maxInValue",
                        hi_in,
                        format!("must be greater than minInValue {}", format_sig7(lo_in)),
                    ));
                }
                if lo_out > hi_out {
                    return Err(OpError::invalid(
                        OpKind::Range,
                        "maxOutValue",
                        hi_out,
                        format!("must not be less than minOutValue {}", format_sig7(lo_out)),
                    ));
                }
            }
            (Some(lo_in), None, Some(lo_out), None) if lo_in != lo_out => {
                return Err(OpError::invalid(
                    OpKind::Range,
                    "minOutValue",
                    lo_out,
                    "must equal minInValue when the max side is empty",
                ));
            }
            (None, Some(hi_in), None, Some(hi_out)) if hi_in != hi_out => {
                return Err(OpError::invalid(
                    OpKind::Range,
                    "maxOutValue",
                    hi_out,
                    "must equal maxInValue when the min side is empty",
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Lower side is set.
    pub fn has_min(&self) -> bool {
        self.min_in.is_some()
    }

    /// Upper side is set.
    pub fn has_max(&self) -> bool {
        self.max_in.is_some()
    }

    /// Both sides are set.
    pub fn is_bounded(&self) -> bool {
        self.has_min() && self.has_max()
    }

    /// Derived scale; one unless both sides are set.
    pub fn scale(&self) -> f64 {
        match (self.min_in, self.max_in, self.min_out, self.max_out) {
            (Some(lo_in), Some(hi_in), Some(lo_out), Some(hi_out)) => (hi_out - lo_out) / (hi_in - lo_in),
            _ => 1.0,
        }
    }

    /// Derived offset.
    pub fn offset(&self) -> f64 {
        let s = self.scale();
        match (self.min_in, self.min_out, self.max_in, self.max_out) {
            (Some(lo_in), Some(lo_out), _, _) => lo_out - s * lo_in,
            (_, _, Some(hi_in), Some(hi_out)) => hi_out - s * hi_in,
            _ => 0.0,
        }
    }

    /// Scale is one and offset is zero; the op may still clamp.
    pub fn is_identity(&self) -> bool {
        self.scale() == 1.0 && self.offset() == 0.0
    }

    /// Clamps negatives to zero and nothing else.
    pub fn is_clamp_negs(&self) -> bool {
        self.min_in == Some(0.0) && self.min_out == Some(0.0) && !self.has_max()
    }

    /// Leaves every value in `[0, 1]` unchanged.
    pub fn is_clamp_identity(&self) -> bool {
        self.is_identity() && self.min_out.is_none_or(|lo| lo <= 0.0) && self.max_out.is_none_or(|hi| hi >= 1.0)
    }

    /// Evaluates one channel in double precision.
    pub fn eval(&self, x: f64) -> f64 {
        let mut y = x * self.scale() + self.offset();
        if let Some(lo) = self.min_out {
            y = y.max(lo);
        }
        if let Some(hi) = self.max_out {
            y = y.min(hi);
        }
        y
    }

    /// Swaps the input and output bounds.
    pub fn inverse(&self) -> OpResult<Self> {
        if let (Some(lo), Some(hi)) = (self.min_out, self.max_out)
            && lo == hi
        {
            return Err(OpError::invalid(
                OpKind::Range,
                "maxOutValue",
                hi,
                "a constant range has no inverse",
            ));
        }
        Ok(Self::from_bounds(self.min_out, self.max_out, self.min_in, self.max_in))
    }

    /// Clamp-only range over the same input bounds.
    pub fn identity_replacement(&self) -> OpParams {
        if !self.has_min() && !self.has_max() {
            return OpParams::Matrix(MatrixData::identity());
        }
        OpParams::Range(Self::from_bounds(self.min_in, self.max_in, self.min_in, self.max_in))
    }

    /// Applies `self` first, then `next`, as a single range.
    pub fn compose(&self, next: &Self) -> Self {
        let lo_a = self.min_out.unwrap_or(f64::NEG_INFINITY);
        let hi_a = self.max_out.unwrap_or(f64::INFINITY);
        let lo_b = next.min_in.unwrap_or(f64::NEG_INFINITY);
        let hi_b = next.max_in.unwrap_or(f64::INFINITY);

        let s_a = self.scale();
        let o_a = self.offset();

        // The first stage's codomain misses the second stage's domain, or
        // collapses to a point: every input lands on the same output.
        let lo = lo_a.max(lo_b);
        let hi = hi_a.min(hi_b);
        if lo >= hi || s_a == 0.0 {
            let sample = if lo_a.is_finite() { lo_a } else { hi_a };
            let sample = if s_a == 0.0 { self.eval(0.0) } else { sample };
            return Self::constant(next.eval(sample));
        }

        let s_b = next.scale();
        let o_b = next.offset();
        let min_in = lo.is_finite().then(|| (lo - o_a) / s_a);
        let max_in = hi.is_finite().then(|| (hi - o_a) / s_a);
        let min_out = lo.is_finite().then(|| s_b * lo + o_b);
        let max_out = hi.is_finite().then(|| s_b * hi + o_b);
        Self::from_bounds(min_in, max_in, min_out, max_out)
    }

    /// Diagonal matrix with the derived scale and offset; both sides must be set.
    pub fn to_matrix(&self) -> OpResult<MatrixData> {
        if !self.is_bounded() {
            let param = if self.has_min() { "maxInValue" } else { "minInValue" };
            return Err(OpError::InvalidParameter {
                kind: OpKind::Range,
                param: param.into(),
                value: "empty".into(),
                reason: "both sides must be set to convert to a matrix".into(),
            });
        }
        let s = self.scale();
        let o = self.offset();
        Ok(MatrixData::scale_offset([s, s, s, 1.0], [o, o, o, 0.0]))
    }

    /// Folds a preceding `out = s * in + o` RGB scale into the input bounds.
    ///
    /// Only fully bounded ranges and positive scales fold.
    pub fn absorb_preceding(&self, s: f64, o: f64) -> Option<Self> {
        if !self.is_bounded() || s <= 0.0 {
            return None;
        }
        let (lo, hi) = (self.min_in? - o, self.max_in? - o);
        Some(Self::from_bounds(Some(lo / s), Some(hi / s), self.min_out, self.max_out))
    }

    /// Folds a following `out = s * in + o` RGB scale into the output bounds.
    pub fn absorb_following(&self, s: f64, o: f64) -> Option<Self> {
        if !self.is_bounded() || s <= 0.0 {
            return None;
        }
        Some(Self::from_bounds(self.min_in, self.max_in, Some(s * self.min_out? + o), Some(s * self.max_out? + o)))
    }

    /// Moves a one-sided clamp ahead of a preceding `out = s * in + o`.
    ///
    /// `max(s * x + o, a)` equals `s * max(x, (a - o) / s) + o` for positive
    /// `s`, so the clamp can run first with its bound mapped back.
    pub fn commute_preceding(&self, s: f64, o: f64) -> Option<Self> {
        if self.is_bounded() || !self.is_identity() || s <= 0.0 {
            return None;
        }
        let back = |v: Option<f64>| v.map(|v| (v - o) / s);
        let (lo, hi) = (back(self.min_in), back(self.max_in));
        Some(Self::from_bounds(lo, hi, lo, hi))
    }

    pub(crate) fn cache_id(&self) -> String {
        format!(
            "Range {} {} {} {}",
            opt_str(self.min_in),
            opt_str(self.max_in),
            opt_str(self.min_out),
            opt_str(self.max_out)
        )
    }
}

fn opt_str(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), format_sig7)
}

// ============================================================================
// Renderer
// ============================================================================

/// CPU kernel for a range op.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum RangeRenderer {
    ScaleMinMax { scale: f32, offset: f32, lo: f32, hi: f32 },
    ScaleMin { scale: f32, offset: f32, lo: f32 },
    ScaleMax { scale: f32, offset: f32, hi: f32 },
    Scale { scale: f32, offset: f32 },
    MinMax { lo: f32, hi: f32 },
    Min { lo: f32 },
    Max { hi: f32 },
    Null,
}

impl RangeRenderer {
    /// Picks the kernel for the bounds and derived scale.
    pub fn new(data: &RangeData) -> Self {
        let scale = data.scale() as f32;
        let offset = data.offset() as f32;
        let lo = data.min_out.map(|v| v as f32);
        let hi = data.max_out.map(|v| v as f32);
        let scales = data.scale() != 1.0 || data.offset() != 0.0;
        match (scales, lo, hi) {
            (true, Some(lo), Some(hi)) => Self::ScaleMinMax { scale, offset, lo, hi },
            (true, Some(lo), None) => Self::ScaleMin { scale, offset, lo },
            (true, None, Some(hi)) => Self::ScaleMax { scale, offset, hi },
            (true, None, None) => Self::Scale { scale, offset },
            (false, Some(lo), Some(hi)) => Self::MinMax { lo, hi },
            (false, Some(lo), None) => Self::Min { lo },
            (false, None, Some(hi)) => Self::Max { hi },
            (false, None, None) => Self::Null,
        }
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [f32]) {
        match *self {
            Self::ScaleMinMax { scale, offset, lo, hi } => {
                for_rgb(pixels, |v| (v * scale + offset).max(lo).min(hi))
            }
            Self::ScaleMin { scale, offset, lo } => for_rgb(pixels, |v| (v * scale + offset).max(lo)),
            Self::ScaleMax { scale, offset, hi } => for_rgb(pixels, |v| (v * scale + offset).min(hi)),
            Self::Scale { scale, offset } => for_rgb(pixels, |v| v * scale + offset),
            Self::MinMax { lo, hi } => for_rgb(pixels, |v| v.max(lo).min(hi)),
            Self::Min { lo } => for_rgb(pixels, |v| v.max(lo)),
            Self::Max { hi } => for_rgb(pixels, |v| v.min(hi)),
            Self::Null => {}
        }
    }
}

#[inline]
fn for_rgb(pixels: &mut [f32], f: impl Fn(f32) -> f32) {
    for px in pixels.chunks_exact_mut(4) {
        px[0] = f(px[0]);
        px[1] = f(px[1]);
        px[2] = f(px[2]);
    }
}
