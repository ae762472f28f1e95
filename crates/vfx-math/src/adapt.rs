//! Chromatic Adaptation Transforms (CAT).
//!
//! Matrices and functions for adapting XYZ colors between white points.
//!
//! # Supported Methods
//!
//! - [`BRADFORD`] - Default for every built-in conversion
//! - [`CAT02`] - From the CIECAM02 appearance model
//! - [`XYZ_SCALING`] - Plain diagonal scaling
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::{adapt_matrix, AdaptationMethod, WHITE_D65, WHITE_D60};
//!
//! let d65_to_d60 = adapt_matrix(AdaptationMethod::Bradford, WHITE_D65, WHITE_D60);
//! let w = d65_to_d60 * WHITE_D65;
//! assert!((w.x - WHITE_D60.x).abs() < 1e-12);
//! ```

use crate::{Mat3, Vec3};

// ============================================================================
// White points (XYZ, Y = 1)
// ============================================================================

/// CIE D65.
pub const WHITE_D65: Vec3 = Vec3::new(0.95045592705167, 1.0, 1.08905775075988);

/// ACES / D60 white.
pub const WHITE_D60: Vec3 = Vec3::new(0.95264607456985, 1.0, 1.00882518435159);

/// DCI theatrical white.
pub const WHITE_DCI: Vec3 = Vec3::new(0.89458689458689, 1.0, 0.95441595441595);

/// Equal-energy illuminant E.
pub const WHITE_E: Vec3 = Vec3::new(1.0, 1.0, 1.0);

// ============================================================================
// Chromatic Adaptation Matrices
// ============================================================================

/// Bradford cone response matrix.
///
/// # Reference
///
/// Lam, K.M. (1985). Metamerism and Colour Constancy.
pub const BRADFORD: Mat3 = Mat3::from_rows([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// CAT02 cone response matrix.
pub const CAT02: Mat3 = Mat3::from_rows([
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
]);

/// XYZ Scaling (identity cone space).
pub const XYZ_SCALING: Mat3 = Mat3::IDENTITY;

/// Selects the cone response matrix of a von Kries style adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdaptationMethod {
    /// No adaptation; white points are ignored.
    None,
    /// Bradford.
    #[default]
    Bradford,
    /// CAT02.
    Cat02,
    /// Plain XYZ scaling.
    XyzScaling,
}

impl AdaptationMethod {
    /// Cone response matrix for this method.
    pub fn cone_matrix(self) -> Mat3 {
        match self {
            Self::None | Self::XyzScaling => XYZ_SCALING,
            Self::Bradford => BRADFORD,
            Self::Cat02 => CAT02,
        }
    }
}

// ============================================================================
// Adaptation Functions
// ============================================================================

/// Computes a chromatic adaptation matrix between two white points.
///
/// Returns `M^-1 * diag(dst_cone / src_cone) * M`, or identity when the method
/// is [`AdaptationMethod::None`] or the white points are equal.
pub fn adapt_matrix(method: AdaptationMethod, src_white: Vec3, dst_white: Vec3) -> Mat3 {
    if method == AdaptationMethod::None || src_white == dst_white {
        return Mat3::IDENTITY;
    }
    let cone = method.cone_matrix();
    let Some(cone_inv) = cone.inverse() else {
        return Mat3::IDENTITY;
    };

    let src = cone * src_white;
    let dst = cone * dst_white;
    let scale = Mat3::diagonal(dst.x / src.x, dst.y / src.y, dst.z / src.z);

    cone_inv * scale * cone
}
