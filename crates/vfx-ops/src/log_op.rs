//! Log op: per-channel affine log and antilog curves.
//!
//! Covers pure log2/log10, the affine log used by Cineon-style encodings and
//! the "camera" log which splices a linear toe below a break point.
//!
//! # Formula
//!
//! Forward (lin to log), per channel:
//!
//! ```text
//! out = logSlope * log_base(max(FLT_MIN, linSlope * in + linOffset)) + logOffset
//! ```
//!
//! With `linBreak` set, inputs at or below the break use
//! `out = linearSlope * in + linearOffset`, where the linear segment meets the
//! log segment with matching value (and slope, unless `linearSlope` is given).
//! The inverse (log to lin) is the analytic inverse of the same parameters.
//!
//! # Reference
//!
//! Academy S-2016-001 (ACEScct) uses the camera form with base 2.

use crate::matrix::MatrixData;
use crate::op_data::OpParams;
use crate::range::RangeData;
use crate::{OpError, OpKind, OpResult};
use vfx_core::{TransformDirection, format_sig7};

/// Per-channel log parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Log side slope.
    pub log_side_slope: f64,
    /// Log side offset.
    pub log_side_offset: f64,
    /// Linear side slope.
    pub lin_side_slope: f64,
    /// Linear side offset.
    pub lin_side_offset: f64,
    /// Linear side break point (camera log).
    pub lin_side_break: Option<f64>,
    /// Slope of the linear toe (camera log); derived when `None`.
    pub linear_slope: Option<f64>,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            log_side_slope: 1.0,
            log_side_offset: 0.0,
            lin_side_slope: 1.0,
            lin_side_offset: 0.0,
            lin_side_break: None,
            linear_slope: None,
        }
    }
}

impl LogParams {
    /// Affine log parameters without a break.
    pub const fn new(log_side_slope: f64, log_side_offset: f64, lin_side_slope: f64, lin_side_offset: f64) -> Self {
        Self {
            log_side_slope,
            log_side_offset,
            lin_side_slope,
            lin_side_offset,
            lin_side_break: None,
            linear_slope: None,
        }
    }

    /// Adds a linear toe below `lin_break`.
    pub const fn with_lin_break(mut self, lin_break: f64) -> Self {
        self.lin_side_break = Some(lin_break);
        self
    }

    /// Overrides the derived toe slope.
    pub const fn with_linear_slope(mut self, slope: f64) -> Self {
        self.linear_slope = Some(slope);
        self
    }

    fn is_plain(&self) -> bool {
        self.log_side_slope == 1.0
            && self.log_side_offset == 0.0
            && self.lin_side_slope == 1.0
            && self.lin_side_offset == 0.0
            && self.lin_side_break.is_none()
    }

    fn log_break(&self, base: f64) -> f64 {
        let lin_break = self.lin_side_break.unwrap_or(0.0);
        let arg = self.lin_side_slope * lin_break + self.lin_side_offset;
        self.log_side_slope * arg.ln() / base.ln() + self.log_side_offset
    }

    fn toe_slope(&self, base: f64) -> f64 {
        if let Some(slope) = self.linear_slope {
            return slope;
        }
        let lin_break = self.lin_side_break.unwrap_or(0.0);
        let arg = self.lin_side_slope * lin_break + self.lin_side_offset;
        self.log_side_slope * self.lin_side_slope / (arg * base.ln())
    }

    fn toe_offset(&self, base: f64) -> f64 {
        self.log_break(base) - self.toe_slope(base) * self.lin_side_break.unwrap_or(0.0)
    }

    /// Lin-to-log in double precision.
    pub fn lin_to_log(&self, base: f64, x: f64) -> f64 {
        if let Some(lin_break) = self.lin_side_break
            && x <= lin_break
        {
            return self.toe_slope(base) * x + self.toe_offset(base);
        }
        let arg = (self.lin_side_slope * x + self.lin_side_offset).max(f32::MIN_POSITIVE as f64);
        self.log_side_slope * arg.ln() / base.ln() + self.log_side_offset
    }

    /// Log-to-lin in double precision.
    pub fn log_to_lin(&self, base: f64, y: f64) -> f64 {
        if self.lin_side_break.is_some() && y <= self.log_break(base) {
            return (y - self.toe_offset(base)) / self.toe_slope(base);
        }
        let e = base.powf((y - self.log_side_offset) / self.log_side_slope);
        (e - self.lin_side_offset) / self.lin_side_slope
    }
}

/// Parameters of a log op. The direction lives on the op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogData {
    /// Log base.
    pub base: f64,
    /// Red, green and blue parameters.
    pub channels: [LogParams; 3],
}

impl LogData {
    /// Same parameters on every channel.
    pub const fn uniform(base: f64, params: LogParams) -> Self {
        Self { base, channels: [params, params, params] }
    }

    /// `log2(x)` forward, `2^x` inverse.
    pub const fn log2() -> Self {
        Self::uniform(2.0, LogParams::new(1.0, 0.0, 1.0, 0.0))
    }

    /// `log10(x)` forward, `10^x` inverse.
    pub const fn log10() -> Self {
        Self::uniform(10.0, LogParams::new(1.0, 0.0, 1.0, 0.0))
    }

    /// Checks the base and every channel's parameters.
    pub fn validate(&self) -> OpResult<()> {
        if !self.base.is_finite() || self.base <= 0.0 || self.base == 1.0 {
            return Err(OpError::invalid(OpKind::Log, "base", self.base, "must be positive and not 1"));
        }
        let camera = self.channels[0].lin_side_break.is_some();
        for (c, p) in self.channels.iter().enumerate() {
            let name = |field: &str| format!("{}[{c}]", field);
            for (field, v) in [
                ("logSideSlope", p.log_side_slope),
                ("logSideOffset", p.log_side_offset),
                ("linSideSlope", p.lin_side_slope),
                ("linSideOffset", p.lin_side_offset),
            ] {
                if !v.is_finite() {
                    return Err(OpError::invalid(OpKind::Log, name(field), v, "must be finite"));
                }
            }
            if p.log_side_slope == 0.0 {
                return Err(OpError::invalid(OpKind::Log, name("logSideSlope"), 0.0, "cannot be 0"));
            }
            if p.lin_side_slope == 0.0 {
                return Err(OpError::invalid(OpKind::Log, name("linSideSlope"), 0.0, "cannot be 0"));
            }
            if p.linear_slope.is_some() && p.lin_side_break.is_none() {
                return Err(OpError::InvalidParameter {
                    kind: OpKind::Log,
                    param: name("linearSlope"),
                    value: format_sig7(p.linear_slope.unwrap_or_default()),
                    reason: "requires linSideBreak".into(),
                });
            }
            if p.lin_side_break.is_some() != camera {
                return Err(OpError::InvalidParameter {
                    kind: OpKind::Log,
                    param: name("linSideBreak"),
                    value: p.lin_side_break.map_or_else(|| "-".into(), format_sig7),
                    reason: "must be set on all channels or none".into(),
                });
            }
            if let Some(lin_break) = p.lin_side_break {
                let arg = p.lin_side_slope * lin_break + p.lin_side_offset;
                if !lin_break.is_finite() || arg <= 0.0 {
                    return Err(OpError::invalid(
                        OpKind::Log,
                        name("linSideBreak"),
                        lin_break,
                        "linSideSlope * linSideBreak + linSideOffset must be positive",
                    ));
                }
            }
            if let Some(slope) = p.linear_slope
                && (!slope.is_finite() || slope == 0.0)
            {
                return Err(OpError::invalid(OpKind::Log, name("linearSlope"), slope, "must be finite and non-zero"));
            }
        }
        Ok(())
    }

    /// Has a linear toe.
    pub fn is_camera(&self) -> bool {
        self.channels[0].lin_side_break.is_some()
    }

    /// Red, green and blue share their parameters.
    pub fn all_components_equal(&self) -> bool {
        self.channels[0] == self.channels[1] && self.channels[1] == self.channels[2]
    }

    /// Pure base-2 log.
    pub fn is_log2(&self) -> bool {
        self.base == 2.0 && self.channels.iter().all(LogParams::is_plain)
    }

    /// Pure base-10 log.
    pub fn is_log10(&self) -> bool {
        self.base == 10.0 && self.channels.iter().all(LogParams::is_plain)
    }

    /// What a log followed by its inverse reduces to.
    ///
    /// Lin-to-log clamps its argument at `FLT_MIN`, so the forward pair keeps
    /// a clamp at the point where the argument reaches zero. The log-to-lin
    /// pair and the camera form are defined everywhere.
    pub fn identity_replacement(&self, direction: TransformDirection) -> OpParams {
        if !direction.is_forward() || self.is_camera() {
            return OpParams::Matrix(MatrixData::identity());
        }
        if self.is_log2() || self.is_log10() {
            return OpParams::Range(RangeData::clamp_negatives());
        }
        if !self.all_components_equal() {
            return OpParams::Matrix(MatrixData::identity());
        }
        let p = &self.channels[0];
        let edge = -p.lin_side_offset / p.lin_side_slope;
        let range = if p.lin_side_slope > 0.0 {
            RangeData::lower_clamp(edge)
        } else {
            RangeData::from_bounds(None, Some(edge), None, Some(edge))
        };
        OpParams::Range(range)
    }

    /// Log-to-lin (`self`) followed by lin-to-log (`next`) in the same base
    /// with the same linear side and no toe is an affine map on the log side.
    pub fn compose_log_to_lin_with(&self, next: &Self) -> Option<MatrixData> {
        if self.base != next.base || self.is_camera() || next.is_camera() {
            return None;
        }
        let mut scale = [1.0; 4];
        let mut offset = [0.0; 4];
        for c in 0..3 {
            let (a, b) = (&self.channels[c], &next.channels[c]);
            if a.lin_side_slope != b.lin_side_slope || a.lin_side_offset != b.lin_side_offset {
                return None;
            }
            let ratio = b.log_side_slope / a.log_side_slope;
            scale[c] = ratio;
            offset[c] = b.log_side_offset - ratio * a.log_side_offset;
        }
        let mut m = MatrixData::scale_offset(scale, offset);
        m.cleanup();
        Some(m)
    }

    /// Evaluates one channel in double precision.
    pub fn eval(&self, direction: TransformDirection, channel: usize, x: f64) -> f64 {
        let p = &self.channels[channel];
        if direction.is_forward() { p.lin_to_log(self.base, x) } else { p.log_to_lin(self.base, x) }
    }

    pub(crate) fn cache_id(&self) -> String {
        let mut s = format!("Log {}", format_sig7(self.base));
        for p in &self.channels {
            for v in [p.log_side_slope, p.log_side_offset, p.lin_side_slope, p.lin_side_offset] {
                s.push(' ');
                s.push_str(&format_sig7(v));
            }
            for v in [p.lin_side_break, p.linear_slope] {
                s.push(' ');
                s.push_str(&v.map_or_else(|| "-".to_string(), format_sig7));
            }
        }
        s
    }
}

// ============================================================================
// Renderer
// ============================================================================

const MIN_VALUE: f32 = f32::MIN_POSITIVE;

/// Precomputed float constants for one channel.
#[derive(Debug, Clone, Copy)]
struct ChannelKernel {
    // Log segment, expressed with log2.
    k: f32,
    log_offset: f32,
    lin_slope: f32,
    lin_offset: f32,
    // Linear toe.
    lin_break: f32,
    log_break: f32,
    toe_slope: f32,
    toe_offset: f32,
}

impl ChannelKernel {
    fn new(base: f64, p: &LogParams) -> Self {
        let camera = p.lin_side_break.is_some();
        Self {
            k: (p.log_side_slope / base.log2()) as f32,
            log_offset: p.log_side_offset as f32,
            lin_slope: p.lin_side_slope as f32,
            lin_offset: p.lin_side_offset as f32,
            lin_break: p.lin_side_break.unwrap_or(0.0) as f32,
            log_break: if camera { p.log_break(base) as f32 } else { 0.0 },
            toe_slope: if camera { p.toe_slope(base) as f32 } else { 0.0 },
            toe_offset: if camera { p.toe_offset(base) as f32 } else { 0.0 },
        }
    }

    #[inline]
    fn lin_to_log(&self, v: f32) -> f32 {
        (v * self.lin_slope + self.lin_offset).max(MIN_VALUE).log2() * self.k + self.log_offset
    }

    #[inline]
    fn log_to_lin(&self, v: f32) -> f32 {
        (((v - self.log_offset) / self.k).exp2() - self.lin_offset) / self.lin_slope
    }

    #[inline]
    fn camera_lin_to_log(&self, v: f32) -> f32 {
        if v <= self.lin_break { self.toe_slope * v + self.toe_offset } else { self.lin_to_log(v) }
    }

    #[inline]
    fn camera_log_to_lin(&self, v: f32) -> f32 {
        if v <= self.log_break { (v - self.toe_offset) / self.toe_slope } else { self.log_to_lin(v) }
    }
}

/// Which curve a log renderer evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Log segment only, lin to log.
    LinToLog,
    /// Log segment only, log to lin.
    LogToLin,
    /// Toe plus log segment, lin to log.
    CameraLinToLog,
    /// Toe plus log segment, log to lin.
    CameraLogToLin,
}

/// CPU kernel for a log op.
#[derive(Debug, Clone)]
pub struct LogRenderer {
    style: LogStyle,
    channels: [ChannelKernel; 3],
}

impl LogRenderer {
    /// Precomputes the per-channel constants for `direction`.
    pub fn new(data: &LogData, direction: TransformDirection) -> Self {
        let style = match (data.is_camera(), direction.is_forward()) {
            (false, true) => LogStyle::LinToLog,
            (false, false) => LogStyle::LogToLin,
            (true, true) => LogStyle::CameraLinToLog,
            (true, false) => LogStyle::CameraLogToLin,
        };
        let channels = data.channels.map(|p| ChannelKernel::new(data.base, &p));
        Self { style, channels }
    }

    /// Selected curve.
    pub fn style(&self) -> LogStyle {
        self.style
    }

    /// Processes packed RGBA pixels in place; alpha is unchanged.
    pub fn apply(&self, pixels: &mut [f32]) {
        let [r, g, b] = &self.channels;
        let f: fn(&ChannelKernel, f32) -> f32 = match self.style {
            LogStyle::LinToLog => ChannelKernel::lin_to_log,
            LogStyle::LogToLin => ChannelKernel::log_to_lin,
            LogStyle::CameraLinToLog => ChannelKernel::camera_lin_to_log,
            LogStyle::CameraLogToLin => ChannelKernel::camera_log_to_lin,
        };
        for px in pixels.chunks_exact_mut(4) {
            px[0] = f(r, px[0]);
            px[1] = f(g, px[1]);
            px[2] = f(b, px[2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use vfx_core::TransformDirection::{Forward, Inverse};

    fn acescct() -> LogData {
        LogData::uniform(2.0, LogParams::new(1.0 / 17.52, 9.72 / 17.52, 1.0, 0.0).with_lin_break(0.0078125))
    }

    fn run(r: &LogRenderer, rgb: [f32; 3]) -> [f32; 4] {
        let mut px = [rgb[0], rgb[1], rgb[2], 0.5];
        r.apply(&mut px);
        px
    }

    #[test]
    fn log10_of_one_is_zero() {
        let r = LogRenderer::new(&LogData::log10(), Forward);
        let px = run(&r, [1.0, 10.0, 100.0]);
        assert_abs_diff_eq!(px[0], 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(px[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(px[2], 2.0, epsilon = 1e-6);
        assert_eq!(px[3], 0.5);
    }

    #[test]
    fn antilog2() {
        let r = LogRenderer::new(&LogData::log2(), Inverse);
        let px = run(&r, [0.0, 1.0, -1.0]);
        assert_abs_diff_eq!(px[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(px[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn negatives_clamp_to_flt_min() {
        let r = LogRenderer::new(&LogData::log2(), Forward);
        let px = run(&r, [-1.0, 0.0, f32::MIN_POSITIVE]);
        assert_eq!(px[0], -126.0);
        assert_eq!(px[1], -126.0);
    }

    #[test]
    fn affine_roundtrip() {
        let data = LogData::uniform(10.0, LogParams::new(0.3, 0.6, 0.9, 0.01));
        data.validate().unwrap();
        let fwd = LogRenderer::new(&data, Forward);
        let inv = LogRenderer::new(&data, Inverse);
        for x in [0.0f32, 0.18, 0.5, 1.0, 4.0] {
            let mut px = [x, x, x, 1.0];
            fwd.apply(&mut px);
            inv.apply(&mut px);
            assert_abs_diff_eq!(px[0], x, epsilon = 1e-6 * x.max(1.0));
        }
    }

    #[test]
    fn camera_toe_is_continuous() {
        let data = acescct();
        data.validate().unwrap();
        let p = data.channels[0];
        let below = p.lin_to_log(2.0, 0.0078125);
        let above = p.lin_to_log(2.0, 0.0078125 + 1e-9);
        assert_abs_diff_eq!(below, above, epsilon = 1e-6);
        // ACEScct toe: 10.5402377416545 * x + 0.0729055341958355
        assert_abs_diff_eq!(p.lin_to_log(2.0, 0.0), 0.0729055341958355, epsilon = 1e-9);
    }

    #[test]
    fn camera_roundtrip() {
        let data = acescct();
        let fwd = LogRenderer::new(&data, Forward);
        let inv = LogRenderer::new(&data, Inverse);
        assert_eq!(inv.style(), LogStyle::CameraLogToLin);
        for x in [-0.01f32, 0.0, 0.005, 0.18, 1.0, 10.0] {
            let mut px = [x, x, x, 1.0];
            fwd.apply(&mut px);
            inv.apply(&mut px);
            assert_abs_diff_eq!(px[0], x, epsilon = 2e-6 * x.abs().max(1.0));
        }
    }

    #[test]
    fn validation() {
        let mut d = LogData::log10();
        d.base = 1.0;
        assert!(d.validate().is_err());
        d.base = -2.0;
        assert!(d.validate().is_err());
        let mut d = LogData::log2();
        d.channels[1].lin_side_slope = 0.0;
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("linSideSlope[1]"));
        let mut d = LogData::log2();
        d.channels[0].linear_slope = Some(2.0);
        assert!(d.validate().is_err());
        let mut d = acescct();
        d.channels[2].lin_side_break = None;
        assert!(d.validate().is_err());
    }

    #[test]
    fn identity_replacements() {
        assert_eq!(LogData::log2().identity_replacement(Forward), OpParams::Range(RangeData::clamp_negatives()));
        assert_eq!(LogData::log2().identity_replacement(Inverse), OpParams::Matrix(MatrixData::identity()));
        assert_eq!(acescct().identity_replacement(Forward), OpParams::Matrix(MatrixData::identity()));
        let d = LogData::uniform(10.0, LogParams::new(0.3, 0.6, 2.0, 0.5));
        assert_eq!(d.identity_replacement(Forward), OpParams::Range(RangeData::lower_clamp(-0.25)));
    }

    #[test]
    fn log_to_lin_then_lin_to_log() {
        let a = LogData::uniform(10.0, LogParams::new(0.5, 0.1, 1.0, 0.0));
        let b = LogData::uniform(10.0, LogParams::new(0.25, 0.3, 1.0, 0.0));
        let m = a.compose_log_to_lin_with(&b).unwrap();
        for y in [-0.2, 0.1, 0.7] {
            let direct = b.eval(Forward, 0, a.eval(Inverse, 0, y));
            assert_abs_diff_eq!(m.matrix.get(0, 0) * y + m.offset[0], direct, epsilon = 1e-12);
        }
        assert!(a.compose_log_to_lin_with(&LogData::log2()).is_none());
    }
}
