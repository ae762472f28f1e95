//! Optimization flags and LUT inversion quality.
//!
//! [`OptimizationFlags`] is a plain bitset. Each bit enables one family of
//! rewrites in the optimizer; the presets bundle them into the four
//! intensities callers normally pick from.
//!
//! ```rust
//! use vfx_ops::OptimizationFlags;
//!
//! let flags: OptimizationFlags = "lossless".parse().unwrap();
//! assert!(flags.contains(OptimizationFlags::COMP_MATRIX));
//! assert!(!flags.contains(OptimizationFlags::COMP_LUT1D));
//! assert!(OptimizationFlags::DEFAULT.contains(OptimizationFlags::LUT_INV_FAST));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use crate::{OpError, OpKind};

/// Bitset selecting which optimizer rewrites may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptimizationFlags(u32);

impl OptimizationFlags {
    /// Drop ops that are exact no-ops, and swap clamping identities for
    /// their cheaper identity replacement.
    pub const IDENTITY: Self = Self(1 << 0);
    /// Also replace identity gammas (which clamp negatives) by a Range.
    pub const IDENTITY_GAMMA: Self = Self(1 << 1);
    /// Cancel adjacent Log / inverse-Log pairs.
    pub const PAIR_IDENTITY_LOG: Self = Self(1 << 2);
    /// Cancel adjacent Gamma / inverse-Gamma pairs.
    pub const PAIR_IDENTITY_GAMMA: Self = Self(1 << 3);
    /// Cancel adjacent Lut1D / inverse-Lut1D pairs.
    pub const PAIR_IDENTITY_LUT1D: Self = Self(1 << 4);
    /// Cancel adjacent Lut3D / inverse-Lut3D pairs.
    pub const PAIR_IDENTITY_LUT3D: Self = Self(1 << 5);
    /// Cancel adjacent CDL / inverse-CDL pairs.
    pub const PAIR_IDENTITY_CDL: Self = Self(1 << 6);
    /// Cancel adjacent FixedFunction / inverse pairs.
    pub const PAIR_IDENTITY_FIXED_FUNCTION: Self = Self(1 << 7);
    /// Reserved: recognize CDL pairs with arithmetically inverted
    /// parameters. Not acted upon.
    pub const PAIR_IDENTITY_CDL_PARAMS: Self = Self(1 << 8);
    /// Multiply adjacent matrices.
    pub const COMP_MATRIX: Self = Self(1 << 9);
    /// Compose adjacent ranges.
    pub const COMP_RANGE: Self = Self(1 << 10);
    /// Compose adjacent basic gammas.
    pub const COMP_GAMMA: Self = Self(1 << 11);
    /// Compose an antilog followed by the matching log into a matrix.
    pub const COMP_LOG: Self = Self(1 << 12);
    /// Fuse adjacent 1D LUTs, and absorb a preceding diagonal matrix.
    pub const COMP_LUT1D: Self = Self(1 << 13);
    /// Fuse adjacent 3D LUTs, and absorb a preceding matrix.
    pub const COMP_LUT3D: Self = Self(1 << 14);
    /// Fold a uniform scale matrix into a neighbouring bounded range.
    pub const COMP_MATRIX_RANGE: Self = Self(1 << 15);
    /// Reserved for separable-prefix extraction. Not acted upon.
    pub const COMP_SEPARABLE_PREFIX: Self = Self(1 << 16);
    /// Bake inverse LUTs into forward LUTs instead of evaluating exactly.
    pub const LUT_INV_FAST: Self = Self(1 << 17);
    /// Drop a leading clamp-identity range when the input depth is integer.
    pub const INT_INPUT_CLAMP: Self = Self(1 << 18);
    /// Replace unclamped, power-free CDLs by matrices.
    pub const FAST_CDL_AS_MATRIX: Self = Self(1 << 19);
    /// Drop clamp-only ranges at either end of the sequence.
    pub const DROP_BOUNDARY_CLAMPS: Self = Self(1 << 20);
    /// Approximate MonCurve gammas by a single power.
    pub const APPROX_MONCURVE: Self = Self(1 << 21);

    /// Validate only.
    pub const NONE: Self = Self(0);

    /// Rewrites that preserve output exactly.
    pub const LOSSLESS: Self = Self(
        Self::IDENTITY.0
            | Self::IDENTITY_GAMMA.0
            | Self::PAIR_IDENTITY_LOG.0
            | Self::PAIR_IDENTITY_GAMMA.0
            | Self::PAIR_IDENTITY_LUT1D.0
            | Self::PAIR_IDENTITY_LUT3D.0
            | Self::PAIR_IDENTITY_CDL.0
            | Self::PAIR_IDENTITY_FIXED_FUNCTION.0
            | Self::COMP_MATRIX.0
            | Self::COMP_RANGE.0
            | Self::COMP_MATRIX_RANGE.0
            | Self::INT_INPUT_CLAMP.0,
    );

    /// All safe rewrites, fast LUT inversion.
    pub const DEFAULT: Self = Self(
        Self::LOSSLESS.0
            | Self::COMP_GAMMA.0
            | Self::COMP_LOG.0
            | Self::COMP_LUT1D.0
            | Self::COMP_LUT3D.0
            | Self::LUT_INV_FAST.0,
    );

    /// Default plus approximations.
    pub const VERY_LOSSY: Self = Self(
        Self::DEFAULT.0
            | Self::FAST_CDL_AS_MATRIX.0
            | Self::DROP_BOUNDARY_CLAMPS.0
            | Self::APPROX_MONCURVE.0,
    );

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Whether every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Adds the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Pair-cancellation bit for an op kind, if that kind has one.
    pub fn pair_identity_bit(kind: OpKind) -> Option<Self> {
        match kind {
            OpKind::Log => Some(Self::PAIR_IDENTITY_LOG),
            OpKind::Gamma => Some(Self::PAIR_IDENTITY_GAMMA),
            OpKind::Lut1D => Some(Self::PAIR_IDENTITY_LUT1D),
            OpKind::Lut3D => Some(Self::PAIR_IDENTITY_LUT3D),
            OpKind::Cdl => Some(Self::PAIR_IDENTITY_CDL),
            OpKind::FixedFunction => Some(Self::PAIR_IDENTITY_FIXED_FUNCTION),
            _ => None,
        }
    }

    /// Preset name when the bits match a preset exactly.
    pub fn preset_name(self) -> Option<&'static str> {
        match self {
            Self::NONE => Some("none"),
            Self::LOSSLESS => Some("lossless"),
            Self::DEFAULT => Some("default"),
            Self::VERY_LOSSY => Some("very_lossy"),
            _ => None,
        }
    }
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr for OptimizationFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OptimizationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for OptimizationFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for OptimizationFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for OptimizationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.preset_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

impl FromStr for OptimizationFlags {
    type Err = OpError;

    /// Parses a preset name (case-insensitive, `-` or `_`) or a hex bitmask.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "none" => Ok(Self::NONE),
            "lossless" => Ok(Self::LOSSLESS),
            "default" => Ok(Self::DEFAULT),
            "very_lossy" | "verylossy" => Ok(Self::VERY_LOSSY),
            _ => key
                .strip_prefix("0x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .map(Self)
                .ok_or_else(|| OpError::UnknownStyle {
                    context: "optimization flags",
                    name: s.to_string(),
                }),
        }
    }
}

impl Serialize for OptimizationFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OptimizationFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How an inverse LUT is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LutInversionQuality {
    /// Follow the optimization flags ([`OptimizationFlags::LUT_INV_FAST`]).
    #[default]
    Default,
    /// Always search the forward LUT per pixel.
    Exact,
    /// Always bake a forward approximation of the inverse.
    Fast,
}

impl LutInversionQuality {
    /// Whether inversion ends up on the fast path under `flags`.
    pub fn is_fast(self, flags: OptimizationFlags) -> bool {
        match self {
            Self::Exact => false,
            Self::Fast => true,
            Self::Default => flags.contains(OptimizationFlags::LUT_INV_FAST),
        }
    }

    /// Name used in cache identifiers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Exact => "exact",
            Self::Fast => "fast",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_nest() {
        assert!(OptimizationFlags::DEFAULT.contains(OptimizationFlags::LOSSLESS));
        assert!(OptimizationFlags::VERY_LOSSY.contains(OptimizationFlags::DEFAULT));
        assert!(OptimizationFlags::NONE.is_empty());
        assert!(!OptimizationFlags::LOSSLESS.contains(OptimizationFlags::LUT_INV_FAST));
        assert!(!OptimizationFlags::LOSSLESS.contains(OptimizationFlags::COMP_GAMMA));
        assert!(!OptimizationFlags::DEFAULT.contains(OptimizationFlags::APPROX_MONCURVE));
    }

    #[test]
    fn parse_and_display() {
        for preset in [
            OptimizationFlags::NONE,
            OptimizationFlags::LOSSLESS,
            OptimizationFlags::DEFAULT,
            OptimizationFlags::VERY_LOSSY,
        ] {
            let text = preset.to_string();
            assert_eq!(text.parse::<OptimizationFlags>().unwrap(), preset);
        }
        assert_eq!("Very-Lossy".parse::<OptimizationFlags>().unwrap(), OptimizationFlags::VERY_LOSSY);

        let custom = OptimizationFlags::COMP_MATRIX | OptimizationFlags::IDENTITY;
        assert_eq!(custom.to_string(), "0x00000201");
        assert_eq!("0x00000201".parse::<OptimizationFlags>().unwrap(), custom);
        assert!("fastest".parse::<OptimizationFlags>().is_err());
    }

    #[test]
    fn insert_remove() {
        let mut flags = OptimizationFlags::LOSSLESS;
        flags.insert(OptimizationFlags::LUT_INV_FAST);
        assert!(flags.contains(OptimizationFlags::LUT_INV_FAST));
        flags.remove(OptimizationFlags::LUT_INV_FAST | OptimizationFlags::COMP_MATRIX);
        assert!(!flags.contains(OptimizationFlags::COMP_MATRIX));
        assert!(flags.contains(OptimizationFlags::COMP_RANGE));
    }

    #[test]
    fn inversion_quality() {
        assert!(LutInversionQuality::Default.is_fast(OptimizationFlags::DEFAULT));
        assert!(!LutInversionQuality::Default.is_fast(OptimizationFlags::LOSSLESS));
        assert!(!LutInversionQuality::Exact.is_fast(OptimizationFlags::VERY_LOSSY));
        assert!(LutInversionQuality::Fast.is_fast(OptimizationFlags::NONE));
    }
}
