//! ADX film density to relative log exposure.
//!
//! ADX encodes scanned film as printing density. After a channel-dependent
//! to channel-independent density matrix, this curve maps density to log10
//! relative exposure. It is a piecewise-linear table with linear
//! extrapolation on both ends, clamped so the result stays within half range
//! once exponentiated.
//!
//! # Reference
//!
//! AMPAS S-2008-001 (ACES ADX)

/// (density, log10 exposure) knots.
pub const NONUNIFORM_TABLE: [(f64, f64); 11] = [
    (-0.190, -6.000000000000000),
    (0.010, -2.721718645000000),
    (0.028, -2.521718645000000),
    (0.054, -2.321718645000000),
    (0.095, -2.121718645000000),
    (0.145, -1.921718645000000),
    (0.220, -1.721718645000000),
    (0.300, -1.521718645000000),
    (0.400, -1.321718645000000),
    (0.500, -1.121718645000000),
    (0.600, -0.926545676714876),
];

/// Lowest log exposure produced below the table.
pub const LOG_EXPOSURE_MIN: f64 = -10.0;

/// log10(HALF_MAX): highest log exposure produced above the table.
pub const LOG_EXPOSURE_MAX: f64 = 4.8162678;

/// ADX10 code to channel-dependent density: scale.
pub const ADX10_SCALE: f64 = 1023.0 / 500.0;
/// ADX10 code to channel-dependent density: offset.
pub const ADX10_OFFSET: f64 = -95.0 / 500.0;
/// ADX16 code to channel-dependent density: scale.
pub const ADX16_SCALE: f64 = 65535.0 / 8000.0;
/// ADX16 code to channel-dependent density: offset.
pub const ADX16_OFFSET: f64 = -1520.0 / 8000.0;

/// Channel-independent density to log10 relative exposure.
///
/// ```rust
/// use vfx_transfer::adx::density_to_log_exposure;
///
/// assert!((density_to_log_exposure(0.3) + 1.521718645).abs() < 1e-12);
/// ```
pub fn density_to_log_exposure(density: f64) -> f64 {
    let t = &NONUNIFORM_TABLE;
    let (x0, y0) = t[0];
    let (xn, _) = t[t.len() - 1];

    if density < x0 {
        let slope = (t[1].1 - y0) / (t[1].0 - x0);
        (y0 - slope * (x0 - density)).max(LOG_EXPOSURE_MIN)
    } else if density <= xn {
        interpolate(density)
    } else {
        let ref_pt = (7120.0 - 1520.0) / 8000.0 * (100.0 / 55.0) - 0.18_f64.log10();
        ((100.0 / 55.0) * density - ref_pt).min(LOG_EXPOSURE_MAX)
    }
}

fn interpolate(x: f64) -> f64 {
    let t = &NONUNIFORM_TABLE;
    let i = t.iter().rposition(|&(k, _)| k <= x).unwrap_or(0).min(t.len() - 2);
    let (x0, y0) = t[i];
    let (x1, y1) = t[i + 1];
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}
