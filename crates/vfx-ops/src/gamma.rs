//! Gamma op: per-channel power curves.
//!
//! Two families:
//!
//! - **Basic**: `out = in^γ` (forward) or `in^(1/γ)` (reverse). The plain
//!   style clamps negatives to zero, `Mirror` is odd-symmetric and `PassThru`
//!   leaves negatives unchanged.
//! - **MonCurve**: a power curve with an affine toe, as used by sRGB and
//!   Rec.709 style encodings.
//!
//! # Formula
//!
//! MonCurve forward with exponent `γ` and offset `o`:
//!
//! ```text
//! break = o / (γ - 1)
//! s     = ((γ - 1) / o) * (o * γ / ((γ - 1) * (1 + o)))^γ
//! out   = ((in + o) / (1 + o))^γ     for in >= break
//!         in * s                     otherwise
//! ```
//!
//! Parameters are per channel including alpha.

use std::fmt;
use std::str::FromStr;

use vfx_core::format_sig7;

use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::range::RangeData;
use crate::{OpError, OpKind, OpResult};

/// Exponents closer than this to one compose to exactly one.
const UNITY_SNAP: f64 = 1e-6;

/// Gamma curve style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum GammaStyle {
    BasicFwd,
    BasicRev,
    BasicMirrorFwd,
    BasicMirrorRev,
    BasicPassThruFwd,
    BasicPassThruRev,
    MonCurveFwd,
    MonCurveRev,
    MonCurveMirrorFwd,
    MonCurveMirrorRev,
}

/// Treatment of negative inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negatives {
    Clamp,
    Mirror,
    PassThru,
    // MonCurve toe continues below zero.
    Toe,
}

impl GammaStyle {
    /// Every style, in declaration order.
    pub const ALL: [GammaStyle; 10] = [
        Self::BasicFwd,
        Self::BasicRev,
        Self::BasicMirrorFwd,
        Self::BasicMirrorRev,
        Self::BasicPassThruFwd,
        Self::BasicPassThruRev,
        Self::MonCurveFwd,
        Self::MonCurveRev,
        Self::MonCurveMirrorFwd,
        Self::MonCurveMirrorRev,
    ];

    /// Name as written in CLF files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BasicFwd => "basicFwd",
            Self::BasicRev => "basicRev",
            Self::BasicMirrorFwd => "basicMirrorFwd",
            Self::BasicMirrorRev => "basicMirrorRev",
            Self::BasicPassThruFwd => "basicPassThruFwd",
            Self::BasicPassThruRev => "basicPassThruRev",
            Self::MonCurveFwd => "moncurveFwd",
            Self::MonCurveRev => "moncurveRev",
            Self::MonCurveMirrorFwd => "moncurveMirrorFwd",
            Self::MonCurveMirrorRev => "moncurveMirrorRev",
        }
    }

    /// Style evaluating the inverse curve.
    pub const fn inverse(self) -> Self {
        match self {
            Self::BasicFwd => Self::BasicRev,
            Self::BasicRev => Self::BasicFwd,
            Self::BasicMirrorFwd => Self::BasicMirrorRev,
            Self::BasicMirrorRev => Self::BasicMirrorFwd,
            Self::BasicPassThruFwd => Self::BasicPassThruRev,
            Self::BasicPassThruRev => Self::BasicPassThruFwd,
            Self::MonCurveFwd => Self::MonCurveRev,
            Self::MonCurveRev => Self::MonCurveFwd,
            Self::MonCurveMirrorFwd => Self::MonCurveMirrorRev,
            Self::MonCurveMirrorRev => Self::MonCurveMirrorFwd,
        }
    }

    /// Applies the power (rather than its reciprocal).
    pub const fn is_forward(self) -> bool {
        matches!(
            self,
            Self::BasicFwd | Self::BasicMirrorFwd | Self::BasicPassThruFwd | Self::MonCurveFwd | Self::MonCurveMirrorFwd
        )
    }

    /// Plain power family.
    pub const fn is_basic(self) -> bool {
        !self.is_moncurve()
    }

    /// Power with affine toe.
    pub const fn is_moncurve(self) -> bool {
        matches!(self, Self::MonCurveFwd | Self::MonCurveRev | Self::MonCurveMirrorFwd | Self::MonCurveMirrorRev)
    }

    fn negatives(self) -> Negatives {
        match self {
            Self::BasicFwd | Self::BasicRev => Negatives::Clamp,
            Self::MonCurveFwd | Self::MonCurveRev => Negatives::Toe,
            Self::BasicMirrorFwd | Self::BasicMirrorRev | Self::MonCurveMirrorFwd | Self::MonCurveMirrorRev => {
                Negatives::Mirror
            }
            Self::BasicPassThruFwd | Self::BasicPassThruRev => Negatives::PassThru,
        }
    }

    fn basic(negatives: Negatives, forward: bool) -> Self {
        match (negatives, forward) {
            (Negatives::Clamp, true) => Self::BasicFwd,
            (Negatives::Clamp, false) => Self::BasicRev,
            (Negatives::Mirror, true) => Self::BasicMirrorFwd,
            (Negatives::Mirror, false) => Self::BasicMirrorRev,
            (Negatives::PassThru, true) => Self::BasicPassThruFwd,
            (Negatives::PassThru, false) => Self::BasicPassThruRev,
            (Negatives::Toe, true) => Self::MonCurveFwd,
            (Negatives::Toe, false) => Self::MonCurveRev,
        }
    }
}

impl fmt::Display for GammaStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GammaStyle {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OpError::UnknownStyle { context: "Gamma", name: s.to_string() })
    }
}

/// Exponent and (MonCurve only) offset for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    /// Exponent.
    pub gamma: f64,
    /// Toe offset; zero for the basic family.
    pub offset: f64,
}

impl GammaParams {
    /// Identity parameters.
    pub const IDENTITY: Self = Self { gamma: 1.0, offset: 0.0 };

    /// Basic exponent.
    pub const fn basic(gamma: f64) -> Self {
        Self { gamma, offset: 0.0 }
    }

    /// MonCurve exponent and offset.
    pub const fn moncurve(gamma: f64, offset: f64) -> Self {
        Self { gamma, offset }
    }
}

/// Parameters of a gamma op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaData {
    /// Curve style.
    pub style: GammaStyle,
    /// Red, green, blue and alpha parameters.
    pub params: [GammaParams; 4],
}

impl GammaData {
    /// Style with per-channel parameters.
    pub const fn new(style: GammaStyle, params: [GammaParams; 4]) -> Self {
        Self { style, params }
    }

    /// Same parameters on RGB, identity alpha.
    pub const fn uniform(style: GammaStyle, params: GammaParams) -> Self {
        Self::new(style, [params, params, params, GammaParams::IDENTITY])
    }

    /// Checks parameter bounds for the style.
    pub fn validate(&self) -> OpResult<()> {
        const CHANNELS: [&str; 4] = ["red", "green", "blue", "alpha"];
        for (p, ch) in self.params.iter().zip(CHANNELS) {
            if self.style.is_basic() {
                if !(0.01..=100.0).contains(&p.gamma) {
                    return Err(OpError::invalid(OpKind::Gamma, format!("{ch} gamma"), p.gamma, "must be in [0.01, 100]"));
                }
                if p.offset != 0.0 {
                    return Err(OpError::invalid(
                        OpKind::Gamma,
                        format!("{ch} offset"),
                        p.offset,
                        "basic styles take no offset",
                    ));
                }
            } else {
                if !(1.0..=10.0).contains(&p.gamma) {
                    return Err(OpError::invalid(OpKind::Gamma, format!("{ch} gamma"), p.gamma, "must be in [1, 10]"));
                }
                if !(0.0..=0.9).contains(&p.offset) {
                    return Err(OpError::invalid(OpKind::Gamma, format!("{ch} offset"), p.offset, "must be in [0, 0.9]"));
                }
            }
        }
        Ok(())
    }

    /// Red, green and blue share their parameters.
    pub fn rgb_equal(&self) -> bool {
        self.params[0] == self.params[1] && self.params[1] == self.params[2]
    }

    /// Alpha passes through unchanged.
    pub fn alpha_is_identity(&self) -> bool {
        self.params[3] == GammaParams::IDENTITY
    }

    /// Every channel has unit exponent and zero offset.
    pub fn is_identity(&self) -> bool {
        self.params.iter().all(|p| *p == GammaParams::IDENTITY)
    }

    /// Identity that does not clamp either.
    pub fn is_no_op(&self) -> bool {
        self.is_identity() && self.style.negatives() != Negatives::Clamp
    }

    /// Inverse by swapping the style direction.
    pub fn inverse(&self) -> Self {
        Self::new(self.style.inverse(), self.params)
    }

    /// Clamping basic styles reduce to a negative clamp; others to identity.
    pub fn identity_replacement(&self) -> OpParams {
        match self.style {
            GammaStyle::BasicFwd | GammaStyle::BasicRev => OpParams::Range(RangeData::clamp_negatives()),
            _ => OpParams::Matrix(MatrixData::identity()),
        }
    }

    fn effective_exponent(&self) -> f64 {
        let g = self.params[0].gamma;
        if self.style.is_forward() { g } else { 1.0 / g }
    }

    /// Whether `self` followed by `next` folds into one basic gamma.
    pub fn may_compose(&self, next: &Self) -> bool {
        if !(self.style.is_basic() && next.style.is_basic()) {
            return false;
        }
        if !(self.rgb_equal() && next.rgb_equal() && self.alpha_is_identity() && next.alpha_is_identity()) {
            return false;
        }
        !matches!(
            (self.style.negatives(), next.style.negatives()),
            (Negatives::Mirror, Negatives::PassThru) | (Negatives::PassThru, Negatives::Mirror)
        )
    }

    /// Folds `self` followed by `next` into one op, if allowed.
    ///
    /// The exponents multiply; a product below one is stored as the
    /// reverse style with the reciprocal exponent.
    pub fn compose(&self, next: &Self) -> Option<Self> {
        if !self.may_compose(next) {
            return None;
        }
        let negatives = match (self.style.negatives(), next.style.negatives()) {
            (Negatives::Mirror, Negatives::Mirror) => Negatives::Mirror,
            (Negatives::PassThru, Negatives::PassThru) => Negatives::PassThru,
            _ => Negatives::Clamp,
        };
        let mut e = self.effective_exponent() * next.effective_exponent();
        if (e - 1.0).abs() < UNITY_SNAP {
            e = 1.0;
        }
        let (forward, gamma) = if e >= 1.0 { (true, e) } else { (false, 1.0 / e) };
        let out = Self::uniform(GammaStyle::basic(negatives, forward), GammaParams::basic(gamma));
        out.validate().is_ok().then_some(out)
    }

    /// Basic power with the same exponents, dropping the MonCurve toe.
    pub fn approximate_moncurve(&self) -> Option<Self> {
        let style = match self.style {
            GammaStyle::MonCurveFwd => GammaStyle::BasicFwd,
            GammaStyle::MonCurveRev => GammaStyle::BasicRev,
            GammaStyle::MonCurveMirrorFwd => GammaStyle::BasicMirrorFwd,
            GammaStyle::MonCurveMirrorRev => GammaStyle::BasicMirrorRev,
            _ => return None,
        };
        Some(Self::new(style, self.params.map(|p| GammaParams::basic(p.gamma))))
    }

    /// Evaluates one channel in double precision.
    pub fn eval(&self, channel: usize, x: f64) -> f64 {
        let p = self.params[channel];
        let f = |v: f64| {
            if self.style.is_moncurve() {
                let mc = MonCurve::new(p.gamma, p.offset);
                if self.style.is_forward() { mc.fwd(v) } else { mc.rev(v) }
            } else {
                v.powf(if self.style.is_forward() { p.gamma } else { 1.0 / p.gamma })
            }
        };
        match self.style.negatives() {
            Negatives::Clamp => f(x.max(0.0)),
            Negatives::Toe => f(x),
            Negatives::Mirror => x.signum() * f(x.abs()),
            Negatives::PassThru => {
                if x < 0.0 {
                    x
                } else {
                    f(x)
                }
            }
        }
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!("Gamma {}", self.style);
        for p in &self.params {
            s.push_str(&format!(" {} {}", format_sig7(p.gamma), format_sig7(p.offset)));
        }
        s
    }
}

/// Derived MonCurve constants.
#[derive(Debug, Clone, Copy)]
struct MonCurve {
    gamma: f64,
    offset: f64,
    break_pnt: f64,
    slope: f64,
}

impl MonCurve {
    fn new(gamma: f64, offset: f64) -> Self {
        if gamma == 1.0 {
            return Self { gamma, offset, break_pnt: f64::NEG_INFINITY, slope: 1.0 / (1.0 + offset) };
        }
        let break_pnt = offset / (gamma - 1.0);
        let slope = if offset == 0.0 {
            0.0
        } else {
            ((gamma - 1.0) / offset) * (offset * gamma / ((gamma - 1.0) * (1.0 + offset))).powf(gamma)
        };
        Self { gamma, offset, break_pnt, slope }
    }

    fn fwd(&self, x: f64) -> f64 {
        if x >= self.break_pnt {
            ((x + self.offset) / (1.0 + self.offset)).powf(self.gamma)
        } else {
            x * self.slope
        }
    }

    fn rev(&self, y: f64) -> f64 {
        let y_break = if self.break_pnt.is_finite() { self.break_pnt * self.slope } else { f64::NEG_INFINITY };
        if y >= y_break {
            (1.0 + self.offset) * y.powf(1.0 / self.gamma) - self.offset
        } else if self.slope == 0.0 {
            0.0
        } else {
            y / self.slope
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Float constants for one channel.
#[derive(Debug, Clone, Copy)]
struct GammaKernel {
    exponent: f32,
    offset: f32,
    scale: f32,
    break_pnt: f32,
    slope: f32,
    inv_slope: f32,
}

impl GammaKernel {
    fn new(style: GammaStyle, p: &GammaParams) -> Self {
        if style.is_basic() {
            let e = if style.is_forward() { p.gamma } else { 1.0 / p.gamma };
            return Self { exponent: e as f32, offset: 0.0, scale: 1.0, break_pnt: 0.0, slope: 0.0, inv_slope: 0.0 };
        }
        let mc = MonCurve::new(p.gamma, p.offset);
        if style.is_forward() {
            Self {
                exponent: mc.gamma as f32,
                offset: mc.offset as f32,
                scale: (1.0 / (1.0 + mc.offset)) as f32,
                break_pnt: mc.break_pnt as f32,
                slope: mc.slope as f32,
                inv_slope: 0.0,
            }
        } else {
            let y_break = if mc.break_pnt.is_finite() { mc.break_pnt * mc.slope } else { f64::NEG_INFINITY };
            Self {
                exponent: (1.0 / mc.gamma) as f32,
                offset: mc.offset as f32,
                scale: (1.0 + mc.offset) as f32,
                break_pnt: y_break as f32,
                slope: mc.slope as f32,
                inv_slope: if mc.slope == 0.0 { 0.0 } else { (1.0 / mc.slope) as f32 },
            }
        }
    }

    #[inline]
    fn moncurve_fwd(&self, x: f32) -> f32 {
        if x >= self.break_pnt { ((x + self.offset) * self.scale).powf(self.exponent) } else { x * self.slope }
    }

    #[inline]
    fn moncurve_rev(&self, y: f32) -> f32 {
        if y >= self.break_pnt { self.scale * y.powf(self.exponent) - self.offset } else { y * self.inv_slope }
    }
}

/// CPU kernel for a gamma op.
#[derive(Debug, Clone)]
pub struct GammaRenderer {
    style: GammaStyle,
    channels: [GammaKernel; 4],
}

impl GammaRenderer {
    /// Precomputes the per-channel constants.
    pub fn new(data: &GammaData) -> Self {
        Self { style: data.style, channels: data.params.map(|p| GammaKernel::new(data.style, &p)) }
    }

    /// Processes packed RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [f32]) {
        let k = &self.channels;
        match self.style {
            GammaStyle::BasicFwd | GammaStyle::BasicRev => {
                per_channel(pixels, k, |k, v| v.max(0.0).powf(k.exponent))
            }
            GammaStyle::BasicMirrorFwd | GammaStyle::BasicMirrorRev => {
                per_channel(pixels, k, |k, v| v.abs().powf(k.exponent).copysign(v))
            }
            GammaStyle::BasicPassThruFwd | GammaStyle::BasicPassThruRev => {
                per_channel(pixels, k, |k, v| if v < 0.0 { v } else { v.powf(k.exponent) })
            }
            GammaStyle::MonCurveFwd => per_channel(pixels, k, GammaKernel::moncurve_fwd),
            GammaStyle::MonCurveRev => per_channel(pixels, k, GammaKernel::moncurve_rev),
            GammaStyle::MonCurveMirrorFwd => {
                per_channel(pixels, k, |k, v| k.moncurve_fwd(v.abs()).copysign(v))
            }
            GammaStyle::MonCurveMirrorRev => {
                per_channel(pixels, k, |k, v| k.moncurve_rev(v.abs()).copysign(v))
            }
        }
    }
}

#[inline]
fn per_channel(pixels: &mut [f32], k: &[GammaKernel; 4], f: impl Fn(&GammaKernel, f32) -> f32) {
    for px in pixels.chunks_exact_mut(4) {
        for c in 0..4 {
            px[c] = f(&k[c], px[c]);
        }
    }
}
