//! ACEScct grading log.
//!
//! ACEScc with a linear toe below 2^-7, which keeps shadows from diving
//! towards -inf. The same curve is expressible as a camera-log Log op with
//! base 2 and a linear-side break, which is how the built-in registry builds
//! it; this module is the closed-form reference.
//!
//! # Reference
//!
//! AMPAS S-2016-001

/// Linear break point, 2^-7.
pub const X_BRK: f64 = 0.0078125;

/// Encoded value at the break.
pub const Y_BRK: f64 = 0.155251141552511;

/// Toe slope.
pub const A: f64 = 10.5402377416545;

/// Toe offset.
pub const B: f64 = 0.0729055341958355;

/// ACEScct encode: linear to ACEScct.
///
/// # Formula
///
/// ```text
/// if linear <= 0.0078125:
///     A * linear + B
/// else:
///     (log2(linear) + 9.72) / 17.52
/// ```
pub fn encode(linear: f64) -> f64 {
    if linear <= X_BRK {
        A * linear + B
    } else {
        (linear.log2() + 9.72) / 17.52
    }
}

/// ACEScct decode: ACEScct to linear.
///
/// ```rust
/// use vfx_transfer::acescct::decode;
///
/// assert!((decode(0.4135884) - 0.18).abs() < 1e-6);
/// ```
pub fn decode(cct: f64) -> f64 {
    if cct <= Y_BRK {
        (cct - B) / A
    } else {
        2.0_f64.powf(cct * 17.52 - 9.72)
    }
}
