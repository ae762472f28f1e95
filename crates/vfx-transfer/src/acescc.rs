//! ACEScc grading log.
//!
//! Pure log2 encoding of AP1 linear values with a half-slope extension
//! below 2^-15 so that zero stays finite.
//!
//! # Range
//!
//! - Encoded: approximately [-0.3584, 1.468]
//!
//! # Reference
//!
//! AMPAS S-2014-003

/// 2^-16, the smallest value the log segment sees.
pub const MIN_VAL: f64 = 1.0 / 65536.0;

/// Encoded value below which the half-slope segment applies.
pub const DECODE_BREAK: f64 = (9.72 - 15.0) / 17.52;

/// Lower end of the encoded domain sampled by built-in LUTs.
pub const DOMAIN_MIN: f64 = -0.36;

/// Upper end of the encoded domain sampled by built-in LUTs.
pub const DOMAIN_MAX: f64 = 1.5;

/// ACEScc encode: linear to ACEScc.
///
/// # Formula
///
/// ```text
/// if linear <= 0:
///     (log2(2^-16) + 9.72) / 17.52
/// else if linear < 2^-15:
///     (log2(2^-16 + linear * 0.5) + 9.72) / 17.52
/// else:
///     (log2(linear) + 9.72) / 17.52
/// ```
pub fn encode(linear: f64) -> f64 {
    let v = if linear <= 0.0 {
        MIN_VAL
    } else if linear < 2.0 * MIN_VAL {
        MIN_VAL + linear * 0.5
    } else {
        linear
    };
    (v.log2() + 9.72) / 17.52
}

/// ACEScc decode: ACEScc to linear.
///
/// ```rust
/// use vfx_transfer::acescc::decode;
///
/// assert!((decode(0.4135884) - 0.18).abs() < 1e-6);
/// ```
pub fn decode(cc: f64) -> f64 {
    let p = 2.0_f64.powf(cc * 17.52 - 9.72);
    if cc < DECODE_BREAK { (p - MIN_VAL) * 2.0 } else { p }
}

/// Decode of a normalized input `t` in [0, 1] remapped onto
/// [`DOMAIN_MIN`, `DOMAIN_MAX`], the shape baked into the ACEScc built-in LUT.
#[inline]
pub fn decode_normalized(t: f64) -> f64 {
    decode(t * (DOMAIN_MAX - DOMAIN_MIN) + DOMAIN_MIN)
}
