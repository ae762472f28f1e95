//! Bit-depth tags for pipeline boundaries.
//!
//! A [`BitDepth`] names the nominal numeric range of values entering or leaving
//! an op sequence. In memory every op works on normalized floats; the tag only
//! matters for scaling at the boundaries and for serialization.
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::BitDepth;
//!
//! assert_eq!(BitDepth::UInt10.max_value(), Some(1023.0));
//! assert!(BitDepth::F16.is_float());
//!
//! // UINT14 / UINT32 are reserved: parsed, but not evaluated
//! assert!(!BitDepth::UInt14.is_supported());
//! assert_eq!(BitDepth::from_clf_str("12i"), Some(BitDepth::UInt12));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Nominal encoding of a boundary.
///
/// Integer formats:
/// - `UInt8` - [0, 255]
/// - `UInt10` - [0, 1023] (DPX, broadcast)
/// - `UInt12` - [0, 4095] (cinema cameras)
/// - `UInt14` - reserved
/// - `UInt16` - [0, 65535]
/// - `UInt32` - reserved
///
/// Floating-point formats (`F16`, `F32`) have a nominal max of 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BitDepth {
    /// Unknown / not specified.
    #[serde(rename = "unknown")]
    Unknown,
    /// 8-bit unsigned integer.
    #[serde(rename = "8i")]
    UInt8,
    /// 10-bit unsigned integer.
    #[serde(rename = "10i")]
    UInt10,
    /// 12-bit unsigned integer.
    #[serde(rename = "12i")]
    UInt12,
    /// 14-bit unsigned integer (reserved).
    #[serde(rename = "14i")]
    UInt14,
    /// 16-bit unsigned integer.
    #[serde(rename = "16i")]
    UInt16,
    /// 32-bit unsigned integer (reserved).
    #[serde(rename = "32i")]
    UInt32,
    /// 16-bit half float.
    #[serde(rename = "16f")]
    F16,
    /// 32-bit float.
    #[default]
    #[serde(rename = "32f")]
    F32,
}

impl BitDepth {
    /// All tags, in declaration order.
    pub const ALL: [BitDepth; 9] = [
        Self::Unknown,
        Self::UInt8,
        Self::UInt10,
        Self::UInt12,
        Self::UInt14,
        Self::UInt16,
        Self::UInt32,
        Self::F16,
        Self::F32,
    ];

    /// Maximum nominal value, `None` for [`BitDepth::Unknown`].
    ///
    /// Kept in `f64` because composed scale ratios multiply these values.
    #[inline]
    pub const fn max_value(self) -> Option<f64> {
        match self {
            Self::Unknown => None,
            Self::UInt8 => Some(255.0),
            Self::UInt10 => Some(1023.0),
            Self::UInt12 => Some(4095.0),
            Self::UInt14 => Some(16383.0),
            Self::UInt16 => Some(65535.0),
            Self::UInt32 => Some(4294967295.0),
            Self::F16 | Self::F32 => Some(1.0),
        }
    }

    /// Whether this is a floating-point encoding.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether this is an integer encoding.
    #[inline]
    pub const fn is_integer(self) -> bool {
        !self.is_float() && !matches!(self, Self::Unknown)
    }

    /// Whether ops may be evaluated at this depth.
    ///
    /// UINT14 and UINT32 are accepted at boundaries but never evaluated.
    #[inline]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown | Self::UInt14 | Self::UInt32)
    }

    /// Ratio that rescales a value nominal in `self` to be nominal in `to`.
    ///
    /// Returns `None` when either side is unknown.
    pub fn scale_to(self, to: BitDepth) -> Option<f64> {
        Some(to.max_value()? / self.max_value()?)
    }

    /// Parses the CLF short form ("8i", "10i", "16f", "32f", ...).
    pub fn from_clf_str(s: &str) -> Option<Self> {
        match s.trim() {
            "8i" => Some(Self::UInt8),
            "10i" => Some(Self::UInt10),
            "12i" => Some(Self::UInt12),
            "14i" => Some(Self::UInt14),
            "16i" => Some(Self::UInt16),
            "32i" => Some(Self::UInt32),
            "16f" => Some(Self::F16),
            "32f" => Some(Self::F32),
            _ => None,
        }
    }

    /// CLF short form of this tag.
    pub const fn clf_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::UInt8 => "8i",
            Self::UInt10 => "10i",
            Self::UInt12 => "12i",
            Self::UInt14 => "14i",
            Self::UInt16 => "16i",
            Self::UInt32 => "32i",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clf_str())
    }
}

impl FromStr for BitDepth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(depth) = Self::from_clf_str(&lower) {
            return Ok(depth);
        }
        match lower.as_str() {
            "unknown" => Ok(Self::Unknown),
            "uint8" => Ok(Self::UInt8),
            "uint10" => Ok(Self::UInt10),
            "uint12" => Ok(Self::UInt12),
            "uint14" => Ok(Self::UInt14),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "f16" | "half" => Ok(Self::F16),
            "f32" | "float" => Ok(Self::F32),
            _ => Err(Error::UnknownBitDepth(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_values() {
        assert_eq!(BitDepth::UInt8.max_value(), Some(255.0));
        assert_eq!(BitDepth::UInt12.max_value(), Some(4095.0));
        assert_eq!(BitDepth::UInt16.max_value(), Some(65535.0));
        assert_eq!(BitDepth::F16.max_value(), Some(1.0));
        assert_eq!(BitDepth::Unknown.max_value(), None);
    }

    #[test]
    fn reserved_depths_are_unsupported() {
        assert!(!BitDepth::UInt14.is_supported());
        assert!(!BitDepth::UInt32.is_supported());
        assert!(!BitDepth::Unknown.is_supported());
        assert!(BitDepth::UInt10.is_supported());
    }

    #[test]
    fn scale_ratio() {
        let r = BitDepth::UInt8.scale_to(BitDepth::UInt16).unwrap();
        assert_eq!(r, 257.0);
        assert!(BitDepth::Unknown.scale_to(BitDepth::F32).is_none());
    }

    #[test]
    fn parse() {
        assert_eq!("10i".parse::<BitDepth>().unwrap(), BitDepth::UInt10);
        assert_eq!("UINT16".parse::<BitDepth>().unwrap(), BitDepth::UInt16);
        assert_eq!("half".parse::<BitDepth>().unwrap(), BitDepth::F16);
        assert!("11i".parse::<BitDepth>().is_err());
        for d in BitDepth::ALL {
            assert_eq!(d.clf_str().parse::<BitDepth>().unwrap(), d);
        }
    }
}
