//! Half-float domain helpers.
//!
//! A half-domain 1D LUT has one entry per 16-bit half code (65536 entries),
//! so lookup is an exact index instead of an interpolation. Codes follow the
//! IEEE 754 binary16 layout provided by [`half::f16`].
//!
//! ```text
//! 0x0000 ..= 0x7BFF   +0 .. +65504
//! 0x7C00              +inf
//! 0x7C01 ..= 0x7FFF   NaN
//! 0x8000 ..= 0xFBFF   -0 .. -65504
//! 0xFC00              -inf
//! 0xFC01 ..= 0xFFFF   NaN
//! ```

use half::f16;

/// Largest finite half value.
pub const HALF_MAX: f32 = 65504.0;

/// Number of entries in a half-domain LUT.
pub const HALF_DOMAIN_SIZE: usize = 65536;

/// Code of +0.
pub const POS_ZERO: u16 = 0x0000;
/// Code of +1.0.
pub const POS_ONE: u16 = 0x3C00;
/// Code of +65504.
pub const POS_HALF_MAX: u16 = 0x7BFF;
/// Code of +inf.
pub const POS_INF: u16 = 0x7C00;
/// Code of -0.
pub const NEG_ZERO: u16 = 0x8000;
/// Code of -65504.
pub const NEG_HALF_MAX: u16 = 0xFBFF;
/// Code of -inf.
pub const NEG_INF: u16 = 0xFC00;

/// Value of a half code.
#[inline]
pub fn code_to_f32(code: u16) -> f32 {
    f16::from_bits(code).to_f32()
}

/// Nearest half code of a float.
#[inline]
pub fn f32_to_code(v: f32) -> u16 {
    f16::from_f32(v).to_bits()
}

/// Whether a half code is NaN.
#[inline]
pub fn is_nan_code(code: u16) -> bool {
    f16::from_bits(code).is_nan()
}

/// Whether a half code is negative (sign bit set, NaN excluded).
#[inline]
pub fn is_negative_code(code: u16) -> bool {
    code & 0x8000 != 0 && !is_nan_code(code)
}

/// Replaces values a half LUT cannot index.
///
/// NaN maps to 0 and infinities are clamped to +/-[`HALF_MAX`].
#[inline]
pub fn sanitize(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(-HALF_MAX, HALF_MAX) }
}

/// Fills a buffer with the value of every half code, in code order.
///
/// Used to build the identity lookup domain of half-domain LUTs.
pub fn domain_values() -> Vec<f32> {
    (0..=u16::MAX).map(code_to_f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_codes() {
        assert_eq!(code_to_f32(POS_ONE), 1.0);
        assert_eq!(code_to_f32(POS_HALF_MAX), HALF_MAX);
        assert_eq!(code_to_f32(NEG_HALF_MAX), -HALF_MAX);
        assert!(code_to_f32(POS_INF).is_infinite());
        assert!(is_nan_code(0x7E00));
        assert!(is_negative_code(NEG_ZERO));
        assert!(!is_negative_code(0xFE00));
    }

    #[test]
    fn sanitize_special_values() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), HALF_MAX);
        assert_eq!(sanitize(f32::NEG_INFINITY), -HALF_MAX);
        assert_eq!(sanitize(0.25), 0.25);
    }

    #[test]
    fn domain_is_identity_on_codes() {
        let d = domain_values();
        assert_eq!(d.len(), HALF_DOMAIN_SIZE);
        assert_eq!(f32_to_code(d[POS_ONE as usize]), POS_ONE);
    }
}
