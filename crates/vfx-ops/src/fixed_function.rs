//! FixedFunction op: named closed-form color transforms.
//!
//! Each style is a self-contained formula with a fixed parameter count:
//!
//! | Style family                 | Params | Notes                                 |
//! |------------------------------|--------|---------------------------------------|
//! | ACES red modifier 0.3 / 1.0  | 0      | hue-weighted red desaturation         |
//! | ACES glow 0.3 / 1.0          | 0      | saturation-driven dark glow           |
//! | ACES dark to dim 1.0         | 0      | AP1 luminance power 0.9811            |
//! | ACES gamut compression 1.3   | 7      | cyan/magenta/yellow limits, thresholds, power |
//! | REC.2100 surround            | 1      | luminance power in [0.001, 100]       |
//! | RGB / HSV                    | 0      | extended-range HSV                    |
//! | XYZ / xyY, uvY, L*u*v*       | 0      | CIE chromaticity spaces, D65 white    |
//! | Lin / PQ                     | 0      | ST 2084, linear in nits/100           |
//! | Lin / GammaLog               | 10     | gamma toe spliced to a log segment    |
//! | Lin / DoubleLog              | 13     | two log segments around a linear one  |
//!
//! Every style has an inverse partner; inverting an op swaps the style.

use std::fmt;
use std::str::FromStr;

use vfx_core::format_sig7;
use vfx_transfer::pq;

use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::{OpError, OpKind, OpResult};

/// Fixed function formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum FixedFunctionStyle {
    AcesRedMod03Fwd,
    AcesRedMod03Inv,
    AcesRedMod10Fwd,
    AcesRedMod10Inv,
    AcesGlow03Fwd,
    AcesGlow03Inv,
    AcesGlow10Fwd,
    AcesGlow10Inv,
    AcesDarkToDim10Fwd,
    AcesDarkToDim10Inv,
    AcesGamutComp13Fwd,
    AcesGamutComp13Inv,
    Rec2100SurroundFwd,
    Rec2100SurroundInv,
    RgbToHsv,
    HsvToRgb,
    XyzToXyY,
    XyYToXyz,
    XyzToUvY,
    UvYToXyz,
    XyzToLuv,
    LuvToXyz,
    LinToPq,
    PqToLin,
    LinToGammaLog,
    GammaLogToLin,
    LinToDoubleLog,
    DoubleLogToLin,
}

impl FixedFunctionStyle {
    /// Every style, forward/inverse pairs adjacent.
    pub const ALL: [FixedFunctionStyle; 28] = [
        Self::AcesRedMod03Fwd,
        Self::AcesRedMod03Inv,
        Self::AcesRedMod10Fwd,
        Self::AcesRedMod10Inv,
        Self::AcesGlow03Fwd,
        Self::AcesGlow03Inv,
        Self::AcesGlow10Fwd,
        Self::AcesGlow10Inv,
        Self::AcesDarkToDim10Fwd,
        Self::AcesDarkToDim10Inv,
        Self::AcesGamutComp13Fwd,
        Self::AcesGamutComp13Inv,
        Self::Rec2100SurroundFwd,
        Self::Rec2100SurroundInv,
        Self::RgbToHsv,
        Self::HsvToRgb,
        Self::XyzToXyY,
        Self::XyYToXyz,
        Self::XyzToUvY,
        Self::UvYToXyz,
        Self::XyzToLuv,
        Self::LuvToXyz,
        Self::LinToPq,
        Self::PqToLin,
        Self::LinToGammaLog,
        Self::GammaLogToLin,
        Self::LinToDoubleLog,
        Self::DoubleLogToLin,
    ];

    /// Style name used in files and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcesRedMod03Fwd => "RedMod03Fwd",
            Self::AcesRedMod03Inv => "RedMod03Rev",
            Self::AcesRedMod10Fwd => "RedMod10Fwd",
            Self::AcesRedMod10Inv => "RedMod10Rev",
            Self::AcesGlow03Fwd => "Glow03Fwd",
            Self::AcesGlow03Inv => "Glow03Rev",
            Self::AcesGlow10Fwd => "Glow10Fwd",
            Self::AcesGlow10Inv => "Glow10Rev",
            Self::AcesDarkToDim10Fwd => "DarkToDim10",
            Self::AcesDarkToDim10Inv => "DimToDark10",
            Self::AcesGamutComp13Fwd => "GamutComp13Fwd",
            Self::AcesGamutComp13Inv => "GamutComp13Rev",
            Self::Rec2100SurroundFwd => "Rec2100SurroundFwd",
            Self::Rec2100SurroundInv => "Rec2100SurroundRev",
            Self::RgbToHsv => "RGB_TO_HSV",
            Self::HsvToRgb => "HSV_TO_RGB",
            Self::XyzToXyY => "XYZ_TO_xyY",
            Self::XyYToXyz => "xyY_TO_XYZ",
            Self::XyzToUvY => "XYZ_TO_uvY",
            Self::UvYToXyz => "uvY_TO_XYZ",
            Self::XyzToLuv => "XYZ_TO_LUV",
            Self::LuvToXyz => "LUV_TO_XYZ",
            Self::LinToPq => "Lin_TO_PQ",
            Self::PqToLin => "PQ_TO_Lin",
            Self::LinToGammaLog => "Lin_TO_GammaLog",
            Self::GammaLogToLin => "GammaLog_TO_Lin",
            Self::LinToDoubleLog => "Lin_TO_DoubleLog",
            Self::DoubleLogToLin => "DoubleLog_TO_Lin",
        }
    }

    /// The partner style computing the inverse.
    pub const fn inverse(self) -> Self {
        match self {
            Self::AcesRedMod03Fwd => Self::AcesRedMod03Inv,
            Self::AcesRedMod03Inv => Self::AcesRedMod03Fwd,
            Self::AcesRedMod10Fwd => Self::AcesRedMod10Inv,
            Self::AcesRedMod10Inv => Self::AcesRedMod10Fwd,
            Self::AcesGlow03Fwd => Self::AcesGlow03Inv,
            Self::AcesGlow03Inv => Self::AcesGlow03Fwd,
            Self::AcesGlow10Fwd => Self::AcesGlow10Inv,
            Self::AcesGlow10Inv => Self::AcesGlow10Fwd,
            Self::AcesDarkToDim10Fwd => Self::AcesDarkToDim10Inv,
            Self::AcesDarkToDim10Inv => Self::AcesDarkToDim10Fwd,
            Self::AcesGamutComp13Fwd => Self::AcesGamutComp13Inv,
            Self::AcesGamutComp13Inv => Self::AcesGamutComp13Fwd,
            Self::Rec2100SurroundFwd => Self::Rec2100SurroundInv,
            Self::Rec2100SurroundInv => Self::Rec2100SurroundFwd,
            Self::RgbToHsv => Self::HsvToRgb,
            Self::HsvToRgb => Self::RgbToHsv,
            Self::XyzToXyY => Self::XyYToXyz,
            Self::XyYToXyz => Self::XyzToXyY,
            Self::XyzToUvY => Self::UvYToXyz,
            Self::UvYToXyz => Self::XyzToUvY,
            Self::XyzToLuv => Self::LuvToXyz,
            Self::LuvToXyz => Self::XyzToLuv,
            Self::LinToPq => Self::PqToLin,
            Self::PqToLin => Self::LinToPq,
            Self::LinToGammaLog => Self::GammaLogToLin,
            Self::GammaLogToLin => Self::LinToGammaLog,
            Self::LinToDoubleLog => Self::DoubleLogToLin,
            Self::DoubleLogToLin => Self::LinToDoubleLog,
        }
    }

    /// Number of parameters the style takes.
    pub const fn arity(self) -> usize {
        match self {
            Self::AcesGamutComp13Fwd | Self::AcesGamutComp13Inv => 7,
            Self::Rec2100SurroundFwd | Self::Rec2100SurroundInv => 1,
            Self::LinToGammaLog | Self::GammaLogToLin => 10,
            Self::LinToDoubleLog | Self::DoubleLogToLin => 13,
            _ => 0,
        }
    }
}

impl fmt::Display for FixedFunctionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixedFunctionStyle {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OpError::UnknownStyle { context: "FixedFunction", name: s.to_string() })
    }
}

/// Parameters of a fixed function op.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionData {
    /// Formula.
    pub style: FixedFunctionStyle,
    /// Style parameters; length must match the style's arity.
    pub params: Vec<f64>,
}

/// ACES 1.3 reference gamut compression parameters.
pub const ACES_GAMUT_COMP_13_PARAMS: [f64; 7] = [1.147, 1.264, 1.312, 0.815, 0.803, 0.880, 1.2];

impl FixedFunctionData {
    /// Style with parameters; call [`validate`](Self::validate) before use.
    pub fn new(style: FixedFunctionStyle, params: impl Into<Vec<f64>>) -> Self {
        Self { style, params: params.into() }
    }

    /// Parameterless style.
    pub fn style(style: FixedFunctionStyle) -> Self {
        Self::new(style, Vec::new())
    }

    /// Checks arity and per-style parameter bounds.
    pub fn validate(&self) -> OpResult<()> {
        let arity = self.style.arity();
        if self.params.len() != arity {
            return Err(OpError::DimensionMismatch {
                kind: OpKind::FixedFunction,
                param: format!("{} params", self.style),
                expected: arity.to_string(),
                actual: self.params.len(),
            });
        }
        let p = &self.params;
        let bounded = |name: &str, v: f64, lo: f64, hi: f64| {
            if v.is_finite() && (lo..=hi).contains(&v) {
                Ok(())
            } else {
                Err(OpError::invalid(
                    OpKind::FixedFunction,
                    name,
                    v,
                    format!("must be in [{}, {}]", format_sig7(lo), format_sig7(hi)),
                ))
            }
        };
        match self.style {
            FixedFunctionStyle::AcesGamutComp13Fwd | FixedFunctionStyle::AcesGamutComp13Inv => {
                bounded("lim_cyan", p[0], 1.001, 65504.0)?;
                bounded("lim_magenta", p[1], 1.001, 65504.0)?;
                bounded("lim_yellow", p[2], 1.001, 65504.0)?;
                bounded("thr_cyan", p[3], 0.0, 0.9995)?;
                bounded("thr_magenta", p[4], 0.0, 0.9995)?;
                bounded("thr_yellow", p[5], 0.0, 0.9995)?;
                bounded("power", p[6], 1.0, 65504.0)?;
            }
            FixedFunctionStyle::Rec2100SurroundFwd | FixedFunctionStyle::Rec2100SurroundInv => {
                bounded("gamma", p[0], 0.001, 100.0)?;
            }
            FixedFunctionStyle::LinToGammaLog | FixedFunctionStyle::GammaLogToLin => {
                let (mirror, brk, power, base) = (p[0], p[1], p[2], p[5]);
                if !(base > 0.0) || base == 1.0 {
                    return Err(OpError::invalid(OpKind::FixedFunction, "logSeg_base", base, "must be positive and not 1"));
                }
                if !(mirror < brk) {
                    return Err(OpError::invalid(
                        OpKind::FixedFunction,
                        "mirrorPt",
                        mirror,
                        format!("must be smaller than the break point {}", format_sig7(brk)),
                    ));
                }
                if power == 0.0 {
                    return Err(OpError::invalid(OpKind::FixedFunction, "gammaSeg_power", power, "cannot be 0"));
                }
            }
            FixedFunctionStyle::LinToDoubleLog | FixedFunctionStyle::DoubleLogToLin => {
                let (base, break1, break2) = (p[0], p[1], p[2]);
                if !(base > 0.0) || base == 1.0 {
                    return Err(OpError::invalid(OpKind::FixedFunction, "base", base, "must be positive and not 1"));
                }
                if break1 > break2 {
                    return Err(OpError::invalid(
                        OpKind::FixedFunction,
                        "break1",
                        break1,
                        format!("must not exceed break2 {}", format_sig7(break2)),
                    ));
                }
            }
            _ => {}
        }
        if let Some(v) = p.iter().find(|v| !v.is_finite()) {
            return Err(OpError::invalid(OpKind::FixedFunction, "params", *v, "must be finite"));
        }
        Ok(())
    }

    /// Swaps to the partner style; parameters are shared.
    pub fn inverse(&self) -> Self {
        Self::new(self.style.inverse(), self.params.clone())
    }

    /// Whether `other` undoes `self`.
    ///
    /// A surround with the same style and a reciprocal exponent also counts.
    pub fn is_inverse(&self, other: &Self) -> bool {
        if matches!(self.style, FixedFunctionStyle::Rec2100SurroundFwd | FixedFunctionStyle::Rec2100SurroundInv)
            && self.style == other.style
            && let (Some(a), Some(b)) = (self.params.first(), other.params.first())
        {
            return *a == 1.0 / *b;
        }
        *other == self.inverse()
    }

    /// Surround with unit exponent.
    pub fn is_no_op(&self) -> bool {
        matches!(self.style, FixedFunctionStyle::Rec2100SurroundFwd | FixedFunctionStyle::Rec2100SurroundInv)
            && self.params.first() == Some(&1.0)
    }

    /// Fixed functions cancel to an identity matrix.
    pub fn identity_replacement(&self) -> OpParams {
        OpParams::Matrix(MatrixData::identity())
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!("FixedFunction {}", self.style);
        for v in &self.params {
            s.push(' ');
            s.push_str(&format_sig7(*v));
        }
        s
    }
}

// ============================================================================
// ACES red modifier and glow
// ============================================================================

/// Constants of one red modifier version.
#[derive(Debug, Clone, Copy)]
struct RedMod {
    one_minus_scale: f32,
    pivot: f32,
    inv_width: f32,
    noise_limit: f32,
    restore_hue: bool,
}

const RED_MOD_03: RedMod =
    RedMod { one_minus_scale: 0.15, pivot: 0.03, inv_width: 1.909_859_3, noise_limit: 1e-2, restore_hue: true };
const RED_MOD_10: RedMod =
    RedMod { one_minus_scale: 0.18, pivot: 0.03, inv_width: 1.697_652_7, noise_limit: 1e-2, restore_hue: false };

// Quadratic B-spline basis, rows indexed by knot span.
const HUE_BSPLINE: [[f32; 4]; 4] = [
    [0.25, 0.00, 0.00, 0.00],
    [-0.75, 0.75, 0.75, 0.25],
    [0.75, -1.50, 0.00, 1.00],
    [-0.25, 0.75, -0.75, 0.25],
];

fn sat_weight(rgb: [f32; 3], noise_limit: f32) -> f32 {
    let lo = rgb[0].min(rgb[1]).min(rgb[2]);
    let hi = rgb[0].max(rgb[1]).max(rgb[2]);
    (hi.max(1e-10) - lo.max(1e-10)) / hi.max(noise_limit)
}

fn hue_weight(rgb: [f32; 3], inv_width: f32) -> f32 {
    let a = 2.0 * rgb[0] - (rgb[1] + rgb[2]);
    let b = 3f32.sqrt() * (rgb[1] - rgb[2]);
    let knot = b.atan2(a) * inv_width + 2.0;
    // Truncation, so the window's left edge folds into span 0.
    let j = knot as i32;
    if !(0..4).contains(&j) {
        return 0.0;
    }
    let t = knot - j as f32;
    let c = &HUE_BSPLINE[j as usize];
    c[3] + t * (c[2] + t * (c[1] + t * c[0]))
}

// Rescales the non-max channel so the hue survives a new red value.
fn restore_hue(rgb: &mut [f32; 3], new_red: f32) {
    let [red, grn, blu] = *rgb;
    if grn >= blu {
        let f = (grn - blu) / (red - blu).max(1e-10);
        rgb[1] = f * (new_red - blu) + blu;
    } else {
        let f = (blu - grn) / (red - grn).max(1e-10);
        rgb[2] = f * (new_red - grn) + grn;
    }
    rgb[0] = new_red;
}

fn red_mod_fwd(k: &RedMod, mut rgb: [f32; 3]) -> [f32; 3] {
    let f_h = hue_weight(rgb, k.inv_width);
    if f_h > 0.0 {
        let f_s = sat_weight(rgb, k.noise_limit);
        let new_red = rgb[0] + f_h * f_s * (k.pivot - rgb[0]) * k.one_minus_scale;
        if k.restore_hue { restore_hue(&mut rgb, new_red) } else { rgb[0] = new_red }
    }
    rgb
}

fn red_mod_inv(k: &RedMod, mut rgb: [f32; 3]) -> [f32; 3] {
    let f_h = hue_weight(rgb, k.inv_width);
    if f_h > 0.0 {
        let min_chan = rgb[1].min(rgb[2]);
        let a = f_h * k.one_minus_scale - 1.0;
        let b = rgb[0] - f_h * (k.pivot + min_chan) * k.one_minus_scale;
        let c = f_h * k.pivot * min_chan * k.one_minus_scale;
        let new_red = (-b - (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
        if k.restore_hue { restore_hue(&mut rgb, new_red) } else { rgb[0] = new_red }
    }
    rgb
}

/// Constants of one glow version.
#[derive(Debug, Clone, Copy)]
struct Glow {
    gain: f32,
    mid: f32,
}

const GLOW_03: Glow = Glow { gain: 0.075, mid: 0.1 };
const GLOW_10: Glow = Glow { gain: 0.05, mid: 0.08 };

fn glow_terms(k: &Glow, rgb: [f32; 3]) -> (f32, f32) {
    let [r, g, b] = rgb;
    let chroma = (b * (b - g) + g * (g - r) + r * (r - b)).max(0.0).sqrt();
    let yc = (r + g + b + 1.75 * chroma) / 3.0;
    let x = (sat_weight(rgb, 1e-2) - 0.4) * 5.0;
    let sign = x.signum();
    let t = (1.0 - 0.5 * sign * x).max(0.0);
    let s = (1.0 + sign * (1.0 - t * t)) * 0.5;
    (yc, k.gain * s)
}

fn glow_fwd(k: &Glow, rgb: [f32; 3]) -> [f32; 3] {
    let (yc, gain) = glow_terms(k, rgb);
    let out = if yc >= k.mid * 2.0 {
        0.0
    } else if yc <= k.mid * 2.0 / 3.0 {
        gain
    } else {
        gain * (k.mid / yc - 0.5)
    };
    rgb.map(|v| v * (1.0 + out))
}

fn glow_inv(k: &Glow, rgb: [f32; 3]) -> [f32; 3] {
    let (yc, gain) = glow_terms(k, rgb);
    let out = if yc >= k.mid * 2.0 {
        0.0
    } else if yc <= (1.0 + gain) * k.mid * 2.0 / 3.0 {
        -gain / (1.0 + gain)
    } else {
        gain * (k.mid / yc - 0.5) / (gain * 0.5 - 1.0)
    };
    rgb.map(|v| v * (1.0 + out))
}

// ============================================================================
// Luminance powers
// ============================================================================

const AP1_LUMA: [f32; 3] = [0.272_228_72, 0.674_081_77, 0.053_689_52];
const REC2100_LUMA: [f32; 3] = [0.2627, 0.6780, 0.0593];
const DARK_TO_DIM_GAMMA: f32 = 0.9811;

fn luma_power(rgb: [f32; 3], weights: [f32; 3], min_lum: f32, exponent: f32) -> [f32; 3] {
    let y = (weights[0] * rgb[0] + weights[1] * rgb[1] + weights[2] * rgb[2]).max(min_lum);
    let gain = y.powf(exponent);
    rgb.map(|v| v * gain)
}

// ============================================================================
// Gamut compression
// ============================================================================

/// Precomputed per-channel gamut compression constants.
#[derive(Debug, Clone, Copy)]
struct GamutComp {
    thr: [f32; 3],
    scale: [f32; 3],
    power: f32,
}

impl GamutComp {
    fn new(p: &[f64]) -> Self {
        let power = p[6];
        // Scale so that the curve crosses y = 1 at the limit.
        let scale = |lim: f64, thr: f64| (lim - thr) / (((1.0 - thr) / (lim - thr)).powf(-power) - 1.0).powf(1.0 / power);
        Self {
            thr: [p[3] as f32, p[4] as f32, p[5] as f32],
            scale: [scale(p[0], p[3]) as f32, scale(p[1], p[4]) as f32, scale(p[2], p[5]) as f32],
            power: power as f32,
        }
    }

    fn apply(&self, rgb: [f32; 3], forward: bool) -> [f32; 3] {
        let ach = rgb[0].max(rgb[1]).max(rgb[2]);
        if ach == 0.0 {
            return [0.0; 3];
        }
        std::array::from_fn(|c| {
            let dist = (ach - rgb[c]) / ach.abs();
            let (thr, scale, pw) = (self.thr[c], self.scale[c], self.power);
            if dist < thr {
                return rgb[c];
            }
            let nd = (dist - thr) / scale;
            let d = if forward {
                thr + scale * nd / (1.0 + nd.powf(pw)).powf(1.0 / pw)
            } else if dist >= thr + scale {
                dist
            } else {
                let p = nd.powf(pw);
                thr + scale * (-(p / (p - 1.0))).powf(1.0 / pw)
            };
            ach - d * ach.abs()
        })
    }
}

// ============================================================================
// HSV and CIE chromaticity spaces
// ============================================================================

fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [red, grn, blu] = rgb;
    let lo = red.min(grn).min(blu);
    let hi = red.max(grn).max(blu);
    let mut val = hi;
    let mut sat = 0.0;
    let mut hue = 0.0;
    if lo != hi {
        let delta = hi - lo;
        if hi != 0.0 {
            sat = delta / hi;
        }
        hue = if red == hi {
            (grn - blu) / delta
        } else if grn == hi {
            2.0 + (blu - red) / delta
        } else {
            4.0 + (red - grn) / delta
        };
        if hue < 0.0 {
            hue += 6.0;
        }
        hue /= 6.0;
    }
    // Extended range: negative minimum pushes value down and saturation past 1.
    if lo < 0.0 {
        val += lo;
    }
    if -lo > hi {
        sat = (hi - lo) / -lo;
    }
    [hue, sat, val]
}

fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    const MAX_SAT: f32 = 1.999;
    let hue = (hsv[0] - hsv[0].floor()) * 6.0;
    let sat = hsv[1].clamp(0.0, MAX_SAT);
    let val = hsv[2];
    let red = ((hue - 3.0).abs() - 1.0).clamp(0.0, 1.0);
    let grn = (2.0 - (hue - 2.0).abs()).clamp(0.0, 1.0);
    let blu = (2.0 - (hue - 4.0).abs()).clamp(0.0, 1.0);

    let mut hi = val;
    let mut lo = val * (1.0 - sat);
    if sat > 1.0 {
        lo = val * (1.0 - sat) / (2.0 - sat);
        hi = val - lo;
    }
    if val < 0.0 {
        lo = val / (2.0 - sat);
        hi = val - lo;
    }
    let delta = hi - lo;
    [red * delta + lo, grn * delta + lo, blu * delta + lo]
}

fn recip_or_zero(v: f32) -> f32 {
    if v == 0.0 { 0.0 } else { 1.0 / v }
}

fn xyz_to_xyy([x, y, z]: [f32; 3]) -> [f32; 3] {
    let d = recip_or_zero(x + y + z);
    [x * d, y * d, y]
}

fn xyy_to_xyz([x, y, lum]: [f32; 3]) -> [f32; 3] {
    let d = recip_or_zero(y);
    [lum * x * d, lum, lum * (1.0 - x - y) * d]
}

fn xyz_to_uvy([x, y, z]: [f32; 3]) -> [f32; 3] {
    let d = recip_or_zero(x + 15.0 * y + 3.0 * z);
    [4.0 * x * d, 9.0 * y * d, y]
}

fn uvy_to_xyz([u, v, lum]: [f32; 3]) -> [f32; 3] {
    let d = recip_or_zero(v);
    [2.25 * lum * u * d, lum, 0.75 * lum * (4.0 - u - 20.0 / 3.0 * v) * d]
}

/// D65 white u'v' and the L* curve, with L* scaled to [0, 1].
mod luv {
    pub const U_N: f32 = 0.197_830_01;
    pub const V_N: f32 = 0.468_319_99;
    pub const Y_BREAK: f32 = 0.008_856_452;
    pub const L_BREAK: f32 = 0.08;
    pub const KAPPA: f32 = 9.032_963;
}

fn xyz_to_luv(xyz: [f32; 3]) -> [f32; 3] {
    let [u, v, y] = xyz_to_uvy(xyz);
    let l = if y <= luv::Y_BREAK { luv::KAPPA * y } else { 1.16 * y.cbrt() - 0.16 };
    [l, 13.0 * l * (u - luv::U_N), 13.0 * l * (v - luv::V_N)]
}

fn luv_to_xyz([l, us, vs]: [f32; 3]) -> [f32; 3] {
    let d = if l == 0.0 { 0.0 } else { 1.0 / (13.0 * l) };
    let u = us * d + luv::U_N;
    let v = vs * d + luv::V_N;
    let y = if l <= luv::L_BREAK {
        l / luv::KAPPA
    } else {
        let t = (l + 0.16) / 1.16;
        t * t * t
    };
    let dd = if v == 0.0 { 0.0 } else { 0.25 / v };
    [9.0 * y * u * dd, y, y * (12.0 - 3.0 * u - 20.0 * v) * dd]
}

// ============================================================================
// PQ, GammaLog and DoubleLog curves
// ============================================================================

const PQ_M1: f32 = pq::M1 as f32;
const PQ_M2: f32 = pq::M2 as f32;
const PQ_C1: f32 = pq::C1 as f32;
const PQ_C2: f32 = pq::C2 as f32;
const PQ_C3: f32 = pq::C3 as f32;

fn lin_to_pq(v: f32) -> f32 {
    let y = (v * 0.01).abs().powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * y) / (1.0 + PQ_C3 * y)).powf(PQ_M2).copysign(v)
}

fn pq_to_lin(v: f32) -> f32 {
    let x = v.abs().powf(1.0 / PQ_M2);
    (100.0 * ((x - PQ_C1).max(0.0) / (PQ_C2 - PQ_C3 * x)).powf(1.0 / PQ_M1)).copysign(v)
}

/// Two-segment gamma/log curve, odd-symmetric about the mirror point.
#[derive(Debug, Clone, Copy)]
struct GammaLog {
    mirror: f32,
    brk: f32,
    power: f32,
    slope: f32,
    offset: f32,
    log_slope: f32,
    log_off: f32,
    lin_slope: f32,
    lin_off: f32,
    prime_mirror: f32,
    prime_break: f32,
}

impl GammaLog {
    fn new(p: &[f64]) -> Self {
        let (mirror, brk, power, slope, offset) = (p[0], p[1], p[2], p[3], p[4]);
        let log_slope = p[6] / p[5].ln();
        Self {
            mirror: mirror as f32,
            brk: brk as f32,
            power: power as f32,
            slope: slope as f32,
            offset: offset as f32,
            log_slope: log_slope as f32,
            log_off: p[7] as f32,
            lin_slope: p[8] as f32,
            lin_off: p[9] as f32,
            prime_mirror: (slope * (mirror + offset).powf(power)) as f32,
            prime_break: (slope * (brk + offset).powf(power)) as f32,
        }
    }

    fn fwd(&self, v: f32) -> f32 {
        let d = v - self.mirror;
        let e = d.abs() + self.mirror;
        let y = if e < self.brk {
            self.slope * (e + self.offset).powf(self.power)
        } else {
            self.log_slope * (self.lin_slope * e + self.lin_off).ln() + self.log_off
        };
        // Reflect about (mirror, prime_mirror).
        if d < 0.0 { 2.0 * self.prime_mirror - y } else { y }
    }

    fn inv(&self, v: f32) -> f32 {
        let d = v - self.prime_mirror;
        let e = d.abs() + self.prime_mirror;
        let x = if e < self.prime_break {
            (e / self.slope).powf(1.0 / self.power) - self.offset
        } else {
            (((e - self.log_off) / self.log_slope).exp() - self.lin_off) / self.lin_slope
        };
        if d < 0.0 { 2.0 * self.mirror - x } else { x }
    }
}

/// Log, linear, log curve.
#[derive(Debug, Clone, Copy)]
struct DoubleLog {
    break1: f32,
    break2: f32,
    seg1: [f32; 4],
    seg2: [f32; 4],
    lin_slope: f32,
    lin_off: f32,
    prime_break1: f32,
    prime_break2: f32,
}

impl DoubleLog {
    fn new(p: &[f64]) -> Self {
        let ln_base = p[0].ln();
        // [log slope baked for ln, log offset, lin slope, lin offset]
        let seg = |i: usize| [p[i] / ln_base, p[i + 1], p[i + 2], p[i + 3]];
        let (s1, s2) = (seg(3), seg(7));
        let at = |s: [f64; 4], x: f64| s[0] * (s[2] * x + s[3]).ln() + s[1];
        Self {
            break1: p[1] as f32,
            break2: p[2] as f32,
            seg1: s1.map(|v| v as f32),
            seg2: s2.map(|v| v as f32),
            lin_slope: p[11] as f32,
            lin_off: p[12] as f32,
            prime_break1: at(s1, p[1]) as f32,
            prime_break2: at(s2, p[2]) as f32,
        }
    }

    fn fwd(&self, v: f32) -> f32 {
        let log = |s: &[f32; 4]| s[0] * (s[2] * v + s[3]).ln() + s[1];
        if v < self.break1 {
            log(&self.seg1)
        } else if v < self.break2 {
            self.lin_slope * v + self.lin_off
        } else {
            log(&self.seg2)
        }
    }

    fn inv(&self, v: f32) -> f32 {
        let exp = |s: &[f32; 4]| (((v - s[1]) / s[0]).exp() - s[3]) / s[2];
        if v < self.prime_break1 {
            exp(&self.seg1)
        } else if v < self.prime_break2 {
            (v - self.lin_off) / self.lin_slope
        } else {
            exp(&self.seg2)
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Kernel {
    None,
    Exponent(f32),
    GamutComp(GamutComp),
    GammaLog(GammaLog),
    DoubleLog(DoubleLog),
}

/// CPU kernel for a fixed function op.
#[derive(Debug, Clone)]
pub struct FixedFunctionRenderer {
    style: FixedFunctionStyle,
    kernel: Kernel,
}

impl FixedFunctionRenderer {
    /// Precomputes the style's constants; `data` must be validated.
    pub fn new(data: &FixedFunctionData) -> Self {
        use FixedFunctionStyle as S;
        let p = &data.params;
        let kernel = match data.style {
            S::AcesDarkToDim10Fwd => Kernel::Exponent(DARK_TO_DIM_GAMMA - 1.0),
            S::AcesDarkToDim10Inv => Kernel::Exponent(1.0 / DARK_TO_DIM_GAMMA - 1.0),
            S::Rec2100SurroundFwd => Kernel::Exponent((p[0] - 1.0) as f32),
            S::Rec2100SurroundInv => Kernel::Exponent((1.0 / p[0] - 1.0) as f32),
            S::AcesGamutComp13Fwd | S::AcesGamutComp13Inv => Kernel::GamutComp(GamutComp::new(p)),
            S::LinToGammaLog | S::GammaLogToLin => Kernel::GammaLog(GammaLog::new(p)),
            S::LinToDoubleLog | S::DoubleLogToLin => Kernel::DoubleLog(DoubleLog::new(p)),
            _ => Kernel::None,
        };
        Self { style: data.style, kernel }
    }

    fn pixel(&self, rgb: [f32; 3]) -> [f32; 3] {
        use FixedFunctionStyle as S;
        match (self.style, &self.kernel) {
            (S::AcesRedMod03Fwd, _) => red_mod_fwd(&RED_MOD_03, rgb),
            (S::AcesRedMod03Inv, _) => red_mod_inv(&RED_MOD_03, rgb),
            (S::AcesRedMod10Fwd, _) => red_mod_fwd(&RED_MOD_10, rgb),
            (S::AcesRedMod10Inv, _) => red_mod_inv(&RED_MOD_10, rgb),
            (S::AcesGlow03Fwd, _) => glow_fwd(&GLOW_03, rgb),
            (S::AcesGlow03Inv, _) => glow_inv(&GLOW_03, rgb),
            (S::AcesGlow10Fwd, _) => glow_fwd(&GLOW_10, rgb),
            (S::AcesGlow10Inv, _) => glow_inv(&GLOW_10, rgb),
            (S::AcesDarkToDim10Fwd | S::AcesDarkToDim10Inv, Kernel::Exponent(e)) => {
                luma_power(rgb, AP1_LUMA, 1e-10, *e)
            }
            (S::Rec2100SurroundFwd | S::Rec2100SurroundInv, Kernel::Exponent(e)) => {
                luma_power(rgb, REC2100_LUMA, 1e-4, *e)
            }
            (S::AcesGamutComp13Fwd, Kernel::GamutComp(k)) => k.apply(rgb, true),
            (S::AcesGamutComp13Inv, Kernel::GamutComp(k)) => k.apply(rgb, false),
            (S::RgbToHsv, _) => rgb_to_hsv(rgb),
            (S::HsvToRgb, _) => hsv_to_rgb(rgb),
            (S::XyzToXyY, _) => xyz_to_xyy(rgb),
            (S::XyYToXyz, _) => xyy_to_xyz(rgb),
            (S::XyzToUvY, _) => xyz_to_uvy(rgb),
            (S::UvYToXyz, _) => uvy_to_xyz(rgb),
            (S::XyzToLuv, _) => xyz_to_luv(rgb),
            (S::LuvToXyz, _) => luv_to_xyz(rgb),
            (S::LinToPq, _) => rgb.map(lin_to_pq),
            (S::PqToLin, _) => rgb.map(pq_to_lin),
            (S::LinToGammaLog, Kernel::GammaLog(k)) => rgb.map(|v| k.fwd(v)),
            (S::GammaLogToLin, Kernel::GammaLog(k)) => rgb.map(|v| k.inv(v)),
            (S::LinToDoubleLog, Kernel::DoubleLog(k)) => rgb.map(|v| k.fwd(v)),
            (S::DoubleLogToLin, Kernel::DoubleLog(k)) => rgb.map(|v| k.inv(v)),
            _ => rgb,
        }
    }

    /// Processes packed RGBA pixels in place; alpha is unchanged.
    pub fn apply(&self, pixels: &mut [f32]) {
        for px in pixels.chunks_exact_mut(4) {
            let out = self.pixel([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }
}
