//! Transform direction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Composes two directions: applying `other` inside `self`.
    ///
    /// Two inversions cancel out.
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        if self == other { Self::Forward } else { Self::Inverse }
    }

    /// Whether this is [`TransformDirection::Forward`].
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }

    /// Short tag used in cache identifiers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
        }
    }
}

impl fmt::Display for TransformDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Ok(Self::Forward),
            "inverse" | "inv" | "reverse" => Ok(Self::Inverse),
            _ => Err(Error::UnknownDirection(s.to_string())),
        }
    }
}
