//! # vfx-primaries
//!
//! Color primaries, white points, and RGB-XYZ matrix generation.
//!
//! Built-in transforms describe their gamut conversions by chromaticities and
//! let this crate derive the matrices, so no hand-rounded matrix ever enters
//! an op sequence.
//!
//! # Included Primaries
//!
//! | Name | Primary Use |
//! |------|-------------|
//! | [`ACES_AP0`] | ACES2065-1 interchange |
//! | [`ACES_AP1`] | ACEScg / ACEScct working spaces |
//! | [`REC709`] | HDTV, sRGB displays |
//! | [`REC2020`] | UHDTV, HDR |
//! | [`P3_DCI`], [`P3_D65`], [`P3_D60`] | Cinema and wide-gamut displays |
//! | [`CIE_XYZ_E`] | Identity gamut used to reach CIE XYZ |
//!
//! # Usage
//!
//! ```rust
//! use vfx_primaries::{ACES_AP1, ACES_AP0, conversion_matrix};
//! use vfx_math::AdaptationMethod;
//!
//! let ap1_to_ap0 = conversion_matrix(&ACES_AP1, &ACES_AP0, AdaptationMethod::Bradford);
//! assert!((ap1_to_ap0.m[0][0] - 0.6954522414).abs() < 1e-7);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use vfx_math::{adapt_matrix, AdaptationMethod, Mat3, Vec3, WHITE_D65};

/// RGB primaries and white point as CIE xy chromaticities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y)
    pub r: (f64, f64),
    /// Green primary (x, y)
    pub g: (f64, f64),
    /// Blue primary (x, y)
    pub b: (f64, f64),
    /// White point (x, y)
    pub w: (f64, f64),
    /// Display name
    pub name: &'static str,
}

impl Primaries {
    /// White point as XYZ with Y = 1.
    pub fn white_xyz(&self) -> Vec3 {
        xy_to_xyz(self.w.0, self.w.1)
    }
}

// ============================================================================
// Standard Primaries
// ============================================================================

/// CIE XYZ with equal-energy white: RGB equals XYZ.
pub const CIE_XYZ_E: Primaries = Primaries {
    r: (1.0, 0.0),
    g: (0.0, 1.0),
    b: (0.0, 0.0),
    w: (1.0 / 3.0, 1.0 / 3.0),
    name: "CIE-XYZ-E",
};

/// ACES AP0 (ACES2065-1).
pub const ACES_AP0: Primaries = Primaries {
    r: (0.7347, 0.2653),
    g: (0.0000, 1.0000),
    b: (0.0001, -0.0770),
    w: (0.32168, 0.33767),
    name: "ACES AP0",
};

/// ACES AP1 (ACEScg, ACEScc, ACEScct).
pub const ACES_AP1: Primaries = Primaries {
    r: (0.713, 0.293),
    g: (0.165, 0.830),
    b: (0.128, 0.044),
    w: (0.32168, 0.33767),
    name: "ACES AP1",
};

/// Rec.709 / sRGB.
pub const REC709: Primaries = Primaries {
    r: (0.64, 0.33),
    g: (0.30, 0.60),
    b: (0.15, 0.06),
    w: (0.3127, 0.3290),
    name: "Rec.709",
};

/// Rec.2020.
pub const REC2020: Primaries = Primaries {
    r: (0.708, 0.292),
    g: (0.170, 0.797),
    b: (0.131, 0.046),
    w: (0.3127, 0.3290),
    name: "Rec.2020",
};

/// P3 with the DCI theatrical white.
pub const P3_DCI: Primaries = Primaries {
    r: (0.680, 0.320),
    g: (0.265, 0.690),
    b: (0.150, 0.060),
    w: (0.314, 0.351),
    name: "P3-DCI",
};

/// P3 with D65 white.
pub const P3_D65: Primaries = Primaries {
    r: (0.680, 0.320),
    g: (0.265, 0.690),
    b: (0.150, 0.060),
    w: (0.3127, 0.3290),
    name: "P3-D65",
};

/// P3 with the ACES (D60) white.
pub const P3_D60: Primaries = Primaries {
    r: (0.680, 0.320),
    g: (0.265, 0.690),
    b: (0.150, 0.060),
    w: (0.32168, 0.33767),
    name: "P3-D60",
};

// ============================================================================
// Matrix Generation
// ============================================================================

/// Converts xy chromaticity to XYZ with Y = 1.
#[inline]
pub fn xy_to_xyz(x: f64, y: f64) -> Vec3 {
    Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
}

/// RGB to XYZ matrix of a set of primaries.
///
/// The xyz of each primary form the columns of a matrix `P`; the per-primary
/// gains solve `P * gains = white_XYZ`, and the result is `P * diag(gains)`.
/// `P` is always well conditioned for real gamuts; a degenerate set yields
/// the identity.
pub fn rgb_to_xyz_matrix(p: &Primaries) -> Mat3 {
    let col = |(x, y): (f64, f64)| Vec3::new(x, y, 1.0 - x - y);
    let xy = Mat3::from_col_vecs(col(p.r), col(p.g), col(p.b));
    let Some(inv) = xy.inverse() else {
        return Mat3::IDENTITY;
    };
    let gains = inv * p.white_xyz();
    xy * Mat3::diagonal(gains.x, gains.y, gains.z)
}

/// XYZ to RGB matrix of a set of primaries.
pub fn xyz_to_rgb_matrix(p: &Primaries) -> Mat3 {
    rgb_to_xyz_matrix(p).inverse().unwrap_or(Mat3::IDENTITY)
}

/// RGB to RGB conversion between two gamuts, adapting white if they differ.
pub fn conversion_matrix(src: &Primaries, dst: &Primaries, method: AdaptationMethod) -> Mat3 {
    conversion_matrix_with_whites(src, dst, None, None, method)
}

/// RGB to RGB conversion with optional explicit white XYZ overrides.
///
/// Without overrides, gamuts with identical white chromaticities skip
/// adaptation. Otherwise the white of each side is its override or the image
/// of RGB (1, 1, 1).
pub fn conversion_matrix_with_whites(
    src: &Primaries,
    dst: &Primaries,
    src_white: Option<Vec3>,
    dst_white: Option<Vec3>,
    method: AdaptationMethod,
) -> Mat3 {
    let src_rgb2xyz = rgb_to_xyz_matrix(src);
    let dst_rgb2xyz = rgb_to_xyz_matrix(dst);
    let dst_xyz2rgb = dst_rgb2xyz.inverse().unwrap_or(Mat3::IDENTITY);

    let same_white = src_white.is_none() && dst_white.is_none() && src.w == dst.w;
    if same_white || method == AdaptationMethod::None {
        return dst_xyz2rgb * src_rgb2xyz;
    }

    let src_w = src_white.unwrap_or_else(|| src_rgb2xyz * Vec3::ONE);
    let dst_w = dst_white.unwrap_or_else(|| dst_rgb2xyz * Vec3::ONE);
    let cat = adapt_matrix(method, src_w, dst_w);

    dst_xyz2rgb * cat * src_rgb2xyz
}

/// RGB to CIE XYZ with a D65 white, adapting the source white to D65.
pub fn to_xyz_d65(src: &Primaries, method: AdaptationMethod) -> Mat3 {
    conversion_matrix_with_whites(src, &CIE_XYZ_E, None, Some(WHITE_D65), method)
}

/// CIE XYZ with a D65 white to RGB, adapting D65 to the destination white.
pub fn from_xyz_d65(dst: &Primaries, method: AdaptationMethod) -> Mat3 {
    conversion_matrix_with_whites(&CIE_XYZ_E, dst, Some(WHITE_D65), None, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rec709_to_xyz() {
        let m = rgb_to_xyz_matrix(&REC709);
        assert_abs_diff_eq!(m.m[0][0], 0.4123908, epsilon = 1e-6);
        assert_abs_diff_eq!(m.m[1][1], 0.7151687, epsilon = 1e-6);
        assert_abs_diff_eq!(m.m[2][2], 0.9505321, epsilon = 1e-6);
        let w = m * Vec3::ONE;
        assert_abs_diff_eq!(w.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ap1_to_ap0_same_white() {
        let m = conversion_matrix(&ACES_AP1, &ACES_AP0, AdaptationMethod::Bradford);
        let expected = [
            [0.6954522414, 0.1406786965, 0.1638690622],
            [0.0447945634, 0.8596711185, 0.0955343182],
            [-0.0055258826, 0.0040252103, 1.0015006723],
        ];
        for r in 0..3 {
            for c in 0..3 {
                assert_abs_diff_eq!(m.m[r][c], expected[r][c], epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn xyz_e_is_identity_gamut() {
        let m = rgb_to_xyz_matrix(&CIE_XYZ_E);
        for r in 0..3 {
            for c in 0..3 {
                let e = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(m.m[r][c], e, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn to_and_from_xyz_d65_are_inverse() {
        let to = to_xyz_d65(&P3_DCI, AdaptationMethod::Bradford);
        let from = from_xyz_d65(&P3_DCI, AdaptationMethod::Bradford);
        let id = from * to;
        for r in 0..3 {
            for c in 0..3 {
                let e = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(id.m[r][c], e, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn rec709_white_maps_to_d65() {
        let to = to_xyz_d65(&REC709, AdaptationMethod::Bradford);
        let w = to * Vec3::ONE;
        assert_abs_diff_eq!(w.x, WHITE_D65.x, epsilon = 1e-4);
        assert_abs_diff_eq!(w.z, WHITE_D65.z, epsilon = 1e-4);
    }
}
