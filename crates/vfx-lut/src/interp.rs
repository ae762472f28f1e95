//! Interpolation methods for LUT evaluation.

/// Interpolation method for LUT evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Nearest entry, no blending.
    Nearest,

    /// Linear interpolation (1D) / Trilinear (3D).
    ///
    /// Default method, good balance of quality and speed.
    #[default]
    Linear,

    /// Tetrahedral interpolation (3D only).
    ///
    /// Higher quality than trilinear, especially for smooth gradients.
    Tetrahedral,
}

impl Interpolation {
    /// Short lowercase name, used in cache identifiers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Tetrahedral => "tetrahedral",
        }
    }

    /// Whether a 1D LUT can use this method.
    pub const fn valid_for_1d(self) -> bool {
        matches!(self, Self::Nearest | Self::Linear)
    }
}
