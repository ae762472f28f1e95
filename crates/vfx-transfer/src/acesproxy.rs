//! ACESproxy 10-bit.
//!
//! A log2 encoding on legal-range 10-bit codes, meant for on-set monitoring.
//! Values are normalized codes (`code / 1023`).
//!
//! # Reference
//!
//! AMPAS S-2013-001

/// Lowest legal code.
pub const CV_MIN: f64 = 64.0;
/// Highest legal code.
pub const CV_MAX: f64 = 940.0;
/// Code of log2 exposure -2.5 (mid offset).
pub const MID_CV_OFFSET: f64 = 425.0;
/// Codes per stop.
pub const STEPS_PER_STOP: f64 = 50.0;

/// log2 exposure carried by a 10-bit code.
#[inline]
pub fn code_to_log2(cv: f64) -> f64 {
    (cv - MID_CV_OFFSET) / STEPS_PER_STOP - 2.5
}

/// Decode a normalized code to linear, clamping to the legal range.
///
/// ```rust
/// use vfx_transfer::acesproxy::{decode, encode};
///
/// let code = encode(0.18);
/// assert!((decode(code) - 0.18).abs() < 2e-3);
/// ```
pub fn decode(v: f64) -> f64 {
    let cv = (v * 1023.0).clamp(CV_MIN, CV_MAX);
    2.0_f64.powf(code_to_log2(cv))
}

/// Encode linear to a normalized, integer-rounded code.
pub fn encode(linear: f64) -> f64 {
    let cv = if linear <= 0.0 {
        CV_MIN
    } else {
        ((linear.log2() + 2.5) * STEPS_PER_STOP + MID_CV_OFFSET)
            .round()
            .clamp(CV_MIN, CV_MAX)
    };
    cv / 1023.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_range() {
        assert_eq!(encode(0.0), CV_MIN / 1023.0);
        assert_eq!(encode(1e9), CV_MAX / 1023.0);
        assert_eq!(decode(0.0), decode(CV_MIN / 1023.0));
    }

    #[test]
    fn one_code_precision() {
        for &v in &[0.01, 0.18, 1.0, 8.0] {
            let back = decode(encode(v));
            // half a code is 1/100 of a stop
            assert!((back / v).log2().abs() <= 0.0100001, "v={v} back={back}");
        }
    }
}
