//! SMPTE ST 2084 Perceptual Quantizer (PQ).
//!
//! Linear values are expressed in nits/100, so 1.0 is 100 cd/m2 and the
//! top of the curve (10000 nits) is 100.0.
//!
//! # Reference
//!
//! SMPTE ST 2084:2014
//!
//! # Usage
//!
//! ```rust
//! use vfx_transfer::pq;
//!
//! let signal = pq::oetf(1.0);
//! assert!((signal - 0.508078).abs() < 1e-6);
//! ```

/// Peak luminance in cd/m2.
pub const L_MAX_NITS: f64 = 10000.0;

/// Linear value of the curve top, in nits/100.
pub const L_MAX: f64 = L_MAX_NITS / 100.0;

/// Exponent m1.
pub const M1: f64 = 0.25 * 2610.0 / 4096.0;
/// Exponent m2.
pub const M2: f64 = 128.0 * 2523.0 / 4096.0;
/// Coefficient c2.
pub const C2: f64 = 32.0 * 2413.0 / 4096.0;
/// Coefficient c3.
pub const C3: f64 = 32.0 * 2392.0 / 4096.0;
/// Coefficient c1 = c3 - c2 + 1.
pub const C1: f64 = C3 - C2 + 1.0;

/// PQ EOTF: signal [0, 1] to linear nits/100.
///
/// Negative signals decode to 0.
///
/// ```rust
/// use vfx_transfer::pq::eotf;
///
/// assert!((eotf(1.0) - 100.0).abs() < 1e-9);
/// ```
#[inline]
pub fn eotf(v: f64) -> f64 {
    let n = v.max(0.0);
    let x = n.powf(1.0 / M2);
    let l = ((x - C1).max(0.0) / (C2 - C3 * x)).powf(1.0 / M1);
    l * 100.0
}

/// PQ inverse EOTF: linear nits/100 to signal [0, 1].
#[inline]
pub fn oetf(l: f64) -> f64 {
    let y = (l * 0.01).max(0.0).powf(M1);
    let ratpoly = (C1 + C2 * y) / (1.0 + C3 * y);
    ratpoly.max(0.0).powf(M2)
}

/// Mirrored EOTF: odd-symmetric extension to negative signals.
#[inline]
pub fn eotf_mirrored(v: f64) -> f64 {
    eotf(v.abs()).copysign(v)
}

/// Mirrored inverse EOTF.
#[inline]
pub fn oetf_mirrored(l: f64) -> f64 {
    oetf(l.abs()).copysign(l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn roundtrip() {
        for &l in &[0.001, 0.01, 0.18, 1.0, 10.0, 100.0] {
            assert_relative_eq!(eotf(oetf(l)), l, max_relative = 1e-9);
        }
    }

    #[test]
    fn reference_white() {
        assert!((oetf(1.0) - 0.508078).abs() < 1e-6);
        assert_eq!(oetf(0.0), C1.powf(M2));
    }

    #[test]
    fn negative_clamps() {
        assert_eq!(eotf(-0.5), 0.0);
        assert_eq!(eotf_mirrored(-1.0), -eotf(1.0));
    }
}
