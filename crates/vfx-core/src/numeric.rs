//! Small numeric helpers shared across the engine.
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::numeric::{format_sig7, quantize};
//!
//! assert_eq!(format_sig7(0.1234567891), "0.1234568");
//! assert_eq!(quantize(127.5, 255.0), 128.0);
//! ```

/// Quantizes a float to an integer code with round-half-up.
///
/// `round(max(0, min(max_value, v + 0.5)))`, NaN maps to 0.
#[inline]
pub fn quantize(v: f32, max_value: f32) -> f32 {
    (v + 0.5).max(0.0).min(max_value).floor()
}

/// Formats a double with seven significant digits, like `%.7g`.
///
/// Used for cache identifiers, so equal parameters always print equally and
/// any change in the first seven digits changes the text.
pub fn format_sig7(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:.6e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..7).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (6 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_half_up() {
        assert_eq!(quantize(0.5, 255.0), 1.0);
        assert_eq!(quantize(0.49, 255.0), 0.0);
        assert_eq!(quantize(-3.0, 255.0), 0.0);
        assert_eq!(quantize(300.0, 255.0), 255.0);
        assert_eq!(quantize(f32::NAN, 1023.0), 0.0);
    }

    #[test]
    fn sig7_formatting() {
        assert_eq!(format_sig7(1.0), "1");
        assert_eq!(format_sig7(-0.0), "0");
        assert_eq!(format_sig7(0.5), "0.5");
        assert_eq!(format_sig7(2.2), "2.2");
        assert_eq!(format_sig7(1.0 / 3.0), "0.3333333");
        assert_eq!(format_sig7(65504.0), "65504");
        assert_eq!(format_sig7(12345678.0), "1.234568e+07");
        assert_eq!(format_sig7(0.00001234), "1.234e-05");
        assert_eq!(format_sig7(-1.5), "-1.5");
    }

    #[test]
    fn sig7_discriminates_seventh_digit() {
        assert_ne!(format_sig7(0.1234567), format_sig7(0.1234568));
        assert_eq!(format_sig7(0.12345671), format_sig7(0.12345672));
    }
}
