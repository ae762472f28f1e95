//! ASC CDL (Color Decision List) op.
//!
//! Slope, offset and power per channel, then a saturation stage that mixes
//! channels around Rec.709 luma.
//!
//! # Formula
//!
//! ```text
//! v   = in * slope + offset
//! v   = v ^ power
//! out = luma + sat * (v - luma)      luma = 0.2126 R + 0.7152 G + 0.0722 B
//! ```
//!
//! The ASC styles clamp to `[0, 1]` after the affine step and after
//! saturation; the no-clamp styles pass negatives through the power step
//! unchanged. Reverse styles run the inverse steps in reverse order.
//!
//! # Reference
//!
//! ASC CDL Transfer Functions and Interchange Syntax v1.2

use std::fmt;
use std::str::FromStr;

use vfx_core::format_sig7;
use vfx_math::Mat4;

use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::range::RangeData;
use crate::{OpError, OpKind, OpResult};

/// Rec.709 luma weights.
pub const LUMA_REC709: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// CDL clamping and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CdlStyle {
    /// ASC forward, clamping to [0, 1].
    #[default]
    AscFwd,
    /// ASC reverse, clamping to [0, 1].
    AscRev,
    /// Forward without clamps.
    NoClampFwd,
    /// Reverse without clamps.
    NoClampRev,
}

impl CdlStyle {
    /// Every style.
    pub const ALL: [CdlStyle; 4] = [Self::AscFwd, Self::AscRev, Self::NoClampFwd, Self::NoClampRev];

    /// Name as written in CLF files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AscFwd => "Fwd",
            Self::AscRev => "Rev",
            Self::NoClampFwd => "FwdNoClamp",
            Self::NoClampRev => "RevNoClamp",
        }
    }

    /// Style running the inverse.
    pub const fn inverse(self) -> Self {
        match self {
            Self::AscFwd => Self::AscRev,
            Self::AscRev => Self::AscFwd,
            Self::NoClampFwd => Self::NoClampRev,
            Self::NoClampRev => Self::NoClampFwd,
        }
    }

    /// Clamps to `[0, 1]`.
    pub const fn clamps(self) -> bool {
        matches!(self, Self::AscFwd | Self::AscRev)
    }

    /// Runs slope, offset, power, saturation in that order.
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::AscFwd | Self::NoClampFwd)
    }
}

impl fmt::Display for CdlStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CdlStyle {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OpError::UnknownStyle { context: "CDL", name: s.to_string() })
    }
}

/// Parameters of a CDL op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdlData {
    /// Slope per channel.
    pub slope: [f64; 3],
    /// Offset per channel.
    pub offset: [f64; 3],
    /// Power per channel.
    pub power: [f64; 3],
    /// Saturation (1 = unchanged).
    pub saturation: f64,
    /// Clamping and direction.
    pub style: CdlStyle,
}

impl Default for CdlData {
    fn default() -> Self {
        Self::identity(CdlStyle::AscFwd)
    }
}

impl CdlData {
    /// Identity parameters with the given style.
    pub const fn identity(style: CdlStyle) -> Self {
        Self { slope: [1.0; 3], offset: [0.0; 3], power: [1.0; 3], saturation: 1.0, style }
    }

    /// Full parameter set.
    pub const fn new(slope: [f64; 3], offset: [f64; 3], power: [f64; 3], saturation: f64, style: CdlStyle) -> Self {
        Self { slope, offset, power, saturation, style }
    }

    /// Checks slope, power and saturation ranges.
    pub fn validate(&self) -> OpResult<()> {
        for c in 0..3 {
            let (s, o, p) = (self.slope[c], self.offset[c], self.power[c]);
            if !s.is_finite() || s < 0.0 {
                return Err(OpError::invalid(OpKind::Cdl, format!("slope[{c}]"), s, "must be >= 0"));
            }
            if !o.is_finite() {
                return Err(OpError::invalid(OpKind::Cdl, format!("offset[{c}]"), o, "must be finite"));
            }
            if !p.is_finite() || p <= 0.0 {
                return Err(OpError::invalid(OpKind::Cdl, format!("power[{c}]"), p, "must be > 0"));
            }
        }
        if !self.saturation.is_finite() || self.saturation < 0.0 {
            return Err(OpError::invalid(OpKind::Cdl, "saturation", self.saturation, "must be >= 0"));
        }
        Ok(())
    }

    /// Parameters leave values unchanged (clamps aside).
    pub fn is_identity(&self) -> bool {
        self.slope == [1.0; 3] && self.offset == [0.0; 3] && self.power == [1.0; 3] && self.saturation == 1.0
    }

    /// Identity parameters and a non-clamping style.
    pub fn is_no_op(&self) -> bool {
        self.is_identity() && !self.style.clamps()
    }

    /// Power is one on every channel.
    pub fn has_unit_power(&self) -> bool {
        self.power == [1.0; 3]
    }

    /// Same parameters, inverse style.
    pub fn inverse(&self) -> Self {
        Self { style: self.style.inverse(), ..*self }
    }

    /// ASC styles reduce to a `[0, 1]` clamp.
    pub fn identity_replacement(&self) -> OpParams {
        if self.style.clamps() {
            OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0))
        } else {
            OpParams::Matrix(MatrixData::identity())
        }
    }

    /// Unclamped CDL with unit power as a single matrix.
    pub fn to_matrix(&self) -> OpResult<Option<MatrixData>> {
        if self.style.clamps() || !self.has_unit_power() {
            return Ok(None);
        }
        let sat = saturation_matrix(self.saturation);
        let mut slope = Mat4::IDENTITY;
        for c in 0..3 {
            slope.set(c, c, self.slope[c]);
        }
        let fwd = MatrixData::new(slope, [self.offset[0], self.offset[1], self.offset[2], 0.0])
            .compose(&MatrixData::new(sat, [0.0; 4]));
        if self.style.is_forward() {
            Ok(Some(fwd))
        } else {
            fwd.inverse().map(Some).map_err(|_| OpError::SingularMatrix { kind: OpKind::Cdl })
        }
    }

    /// Evaluates one RGB triple in double precision.
    pub fn eval(&self, rgb: [f64; 3]) -> [f64; 3] {
        let clamp = |v: f64| if self.style.clamps() { v.clamp(0.0, 1.0) } else { v };
        let pow = |v: f64, p: f64| if v < 0.0 && !self.style.clamps() { v } else { v.max(0.0).powf(p) };
        let sat = |v: [f64; 3], s: f64| {
            let luma = v[0] * LUMA_REC709[0] + v[1] * LUMA_REC709[1] + v[2] * LUMA_REC709[2];
            v.map(|x| luma + s * (x - luma))
        };
        if self.style.is_forward() {
            let v: [f64; 3] = std::array::from_fn(|c| clamp(rgb[c] * self.slope[c] + self.offset[c]));
            let v: [f64; 3] = std::array::from_fn(|c| pow(v[c], self.power[c]));
            sat(v, self.saturation).map(clamp)
        } else {
            let inv_sat = if self.saturation == 0.0 { 0.0 } else { 1.0 / self.saturation };
            let v = sat(rgb.map(clamp), inv_sat).map(clamp);
            std::array::from_fn(|c| {
                let p = pow(v[c], 1.0 / self.power[c]);
                let inv_slope = if self.slope[c] == 0.0 { 0.0 } else { 1.0 / self.slope[c] };
                clamp((p - self.offset[c]) * inv_slope)
            })
        }
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!("CDL {}", self.style);
        for v in self.slope.iter().chain(&self.offset).chain(&self.power).chain([&self.saturation]) {
            s.push(' ');
            s.push_str(&format_sig7(*v));
        }
        s
    }
}

/// Saturation around Rec.709 luma as a 4x4 matrix.
fn saturation_matrix(sat: f64) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    for r in 0..3 {
        for c in 0..3 {
            let diag = if r == c { sat } else { 0.0 };
            m.set(r, c, diag + (1.0 - sat) * LUMA_REC709[c]);
        }
    }
    m
}

// ============================================================================
// Renderer
// ============================================================================

const LUM_R: f32 = 0.2126;
const LUM_G: f32 = 0.7152;
const LUM_B: f32 = 0.0722;

/// CPU kernel for a CDL op.
#[derive(Debug, Clone)]
pub struct CdlRenderer {
    style: CdlStyle,
    slope: [f32; 3],
    offset: [f32; 3],
    power: [f32; 3],
    saturation: f32,
    skip_power: bool,
    skip_saturation: bool,
}

impl CdlRenderer {
    /// Precomputes the float constants; reverse styles store the inverted ones.
    pub fn new(data: &CdlData) -> Self {
        let fwd = data.style.is_forward();
        let slope = data.slope.map(|s| {
            if fwd {
                s as f32
            } else if s == 0.0 {
                0.0
            } else {
                (1.0 / s) as f32
            }
        });
        let power = data.power.map(|p| if fwd { p as f32 } else { (1.0 / p) as f32 });
        let saturation = if fwd || data.saturation == 0.0 { data.saturation } else { 1.0 / data.saturation };
        Self {
            style: data.style,
            slope,
            offset: data.offset.map(|o| o as f32),
            power,
            saturation: saturation as f32,
            skip_power: data.has_unit_power(),
            skip_saturation: data.saturation == 1.0,
        }
    }

    /// Processes packed RGBA pixels in place; alpha is unchanged.
    pub fn apply(&self, pixels: &mut [f32]) {
        let clamps = self.style.clamps();
        let clamp = |v: f32| if clamps { v.clamp(0.0, 1.0) } else { v };
        for px in pixels.chunks_exact_mut(4) {
            let mut rgb = [px[0], px[1], px[2]];
            if self.style.is_forward() {
                for c in 0..3 {
                    rgb[c] = clamp(rgb[c] * self.slope[c] + self.offset[c]);
                    rgb[c] = self.power(rgb[c], c);
                }
                rgb = self.saturate(rgb).map(clamp);
            } else {
                rgb = self.saturate(rgb.map(clamp)).map(clamp);
                for c in 0..3 {
                    rgb[c] = clamp((self.power(rgb[c], c) - self.offset[c]) * self.slope[c]);
                }
            }
            px[..3].copy_from_slice(&rgb);
        }
    }

    #[inline]
    fn power(&self, v: f32, c: usize) -> f32 {
        if self.skip_power || v < 0.0 { v } else { v.powf(self.power[c]) }
    }

    #[inline]
    fn saturate(&self, rgb: [f32; 3]) -> [f32; 3] {
        if self.skip_saturation {
            return rgb;
        }
        let luma = rgb[0] * LUM_R + rgb[1] * LUM_G + rgb[2] * LUM_B;
        rgb.map(|v| luma + self.saturation * (v - luma))
    }
}
