//! Hybrid Log-Gamma (HLG).
//!
//! Square-root segment for shadows and a log segment for highlights.
//! The scaled variants stretch the scene-light domain to `[0, e_max]`, which
//! is how display-referred encodings reach the curve top at a given peak.
//!
//! # Reference
//!
//! ITU-R BT.2100-2

/// Log segment coefficient a.
pub const A: f64 = 0.17883277;
/// Log segment coefficient b = 1 - 4a.
pub const B: f64 = 1.0 - 4.0 * A;

/// `c = 0.5 - a * ln(4a)`.
#[inline]
pub fn c() -> f64 {
    0.5 - A * (4.0 * A).ln()
}

/// HLG OETF over the standard scene domain [0, 1].
///
/// # Formula
///
/// ```text
/// if E <= 1/12:
///     E' = sqrt(3 * E)
/// else:
///     E' = a * ln(12*E - b) + c
/// ```
#[inline]
pub fn oetf(e: f64) -> f64 {
    oetf_scaled(e, 1.0)
}

/// HLG inverse OETF over the standard domain.
#[inline]
pub fn eotf(ep: f64) -> f64 {
    eotf_scaled(ep, 1.0)
}

/// HLG OETF with the scene domain stretched to `[0, e_max]`.
///
/// The result is capped at 1.
///
/// ```rust
/// use vfx_transfer::hlg::oetf_scaled;
///
/// assert!((oetf_scaled(3.0, 3.0) - 1.0).abs() < 1e-5);
/// ```
pub fn oetf_scaled(e: f64, e_max: f64) -> f64 {
    let b = B * e_max / 12.0;
    let c = (12.0 / e_max).ln() * A + c();
    let e_scale = 3.0 / e_max;
    let e_break = e_max / 12.0;

    let ec = e.max(0.0);
    if e < e_break {
        (ec * e_scale).sqrt()
    } else {
        (A * (ec - b).ln() + c).min(1.0)
    }
}

/// Inverse of [`oetf_scaled`].
pub fn eotf_scaled(ep: f64, e_max: f64) -> f64 {
    let b = B * e_max / 12.0;
    let c = (12.0 / e_max).ln() * A + c();
    let e_scale = 3.0 / e_max;

    if ep <= 0.0 {
        0.0
    } else if ep <= 0.5 {
        ep * ep / e_scale
    } else {
        ((ep - c) / A).exp() + b
    }
}

/// System gamma for a nominal peak luminance `lw` in nits.
#[inline]
pub fn system_gamma(lw: f64) -> f64 {
    1.2 + 0.42 * (lw / 1000.0).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn roundtrip() {
        for i in 0..=100 {
            let e = i as f64 / 100.0;
            assert_abs_diff_eq!(eotf(oetf(e)), e, epsilon = 1e-12);
        }
    }

    #[test]
    fn boundaries() {
        assert_eq!(oetf(0.0), 0.0);
        assert_abs_diff_eq!(oetf(1.0 / 12.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(oetf(1.0), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn scaled_domain() {
        let e_max = 3.0;
        assert_abs_diff_eq!(oetf_scaled(e_max / 12.0, e_max), 0.5, epsilon = 1e-12);
        for &e in &[0.01, 0.2, 1.0, 2.5] {
            assert_abs_diff_eq!(eotf_scaled(oetf_scaled(e, e_max), e_max), e, epsilon = 1e-9);
        }
    }

    #[test]
    fn gamma_at_1000_nits() {
        assert_eq!(system_gamma(1000.0), 1.2);
    }
}
