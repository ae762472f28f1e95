//! sRGB piecewise curve.
//!
//! A MonCurve with gamma 2.4 and offset 0.055; the closed form here is the
//! reference the MonCurve gamma renderer is checked against.
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

/// sRGB EOTF: encoded to linear.
///
/// # Formula
///
/// ```text
/// if V <= 0.04045:
///     L = V / 12.92
/// else:
///     L = ((V + 0.055) / 1.055)^2.4
/// ```
///
/// ```rust
/// use vfx_transfer::srgb::eotf;
///
/// assert!((eotf(0.5) - 0.2140411).abs() < 1e-6);
/// ```
#[inline]
pub fn eotf(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB inverse EOTF: linear to encoded.
#[inline]
pub fn oetf(l: f64) -> f64 {
    if l <= 0.0031308 {
        l * 12.92
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    }
}
