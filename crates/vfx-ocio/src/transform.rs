//! Transform definitions: user-facing parameter carriers that lower to ops.
//!
//! Each transform kind is a plain struct with public fields and a
//! direction. [`Transform`] is the closed sum over them:
//! - Matrix, range, log (pure, affine and camera) and exponent transforms
//! - CDL, 1D and 3D LUTs, fixed functions and allocations
//! - Groups of transforms and named built-in transforms
//!
//! Nothing here evaluates pixels; see [`crate::builder`] for lowering and
//! [`crate::Processor`] for evaluation.

use vfx_core::{BitDepth, TransformDirection};
use vfx_lut::{Lut1D, Lut3D};
use vfx_ops::{Allocation, FixedFunctionStyle, LutInversionQuality};

use crate::OcioResult;
use crate::builtin_transforms;

/// Color transform definition.
#[derive(Debug, Clone)]
pub enum Transform {
    /// 4x4 matrix with offset.
    Matrix(MatrixTransform),
    /// Linear range remap, optionally clamping.
    Range(RangeTransform),
    /// Pure logarithm in a given base.
    Log(LogTransform),
    /// Logarithm with linear and log side affine terms.
    LogAffine(LogAffineTransform),
    /// Affine logarithm with a linear toe.
    LogCamera(LogCameraTransform),
    /// Power function.
    Exponent(ExponentTransform),
    /// Power function with a linear segment near zero.
    ExponentWithLinear(ExponentWithLinearTransform),
    /// ASC color decision list.
    Cdl(CdlTransform),
    /// Per-channel 1D lookup table.
    Lut1D(Lut1DTransform),
    /// 3D lookup table.
    Lut3D(Lut3DTransform),
    /// Closed-form formula.
    FixedFunction(FixedFunctionTransform),
    /// Shaping into `[0, 1]`.
    Allocation(AllocationTransform),
    /// Ordered list of transforms.
    Group(GroupTransform),
    /// Named built-in transform.
    Builtin(BuiltinTransform),
}

impl Transform {
    /// Matrix transform from a row-major 4x4 array.
    pub fn matrix(m: [f64; 16]) -> Self {
        Self::Matrix(MatrixTransform::new(m, [0.0; 4]))
    }

    /// Group of transforms applied in order.
    pub fn group(transforms: Vec<Transform>) -> Self {
        Self::Group(GroupTransform::new(transforms))
    }

    /// Built-in transform by style name (case-insensitive).
    pub fn builtin(style: &str) -> OcioResult<Self> {
        Ok(Self::Builtin(BuiltinTransform::new(style)?))
    }

    /// Short kind name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Matrix(_) => "MatrixTransform",
            Self::Range(_) => "RangeTransform",
            Self::Log(_) => "LogTransform",
            Self::LogAffine(_) => "LogAffineTransform",
            Self::LogCamera(_) => "LogCameraTransform",
            Self::Exponent(_) => "ExponentTransform",
            Self::ExponentWithLinear(_) => "ExponentWithLinearTransform",
            Self::Cdl(_) => "CDLTransform",
            Self::Lut1D(_) => "Lut1DTransform",
            Self::Lut3D(_) => "Lut3DTransform",
            Self::FixedFunction(_) => "FixedFunctionTransform",
            Self::Allocation(_) => "AllocationTransform",
            Self::Group(_) => "GroupTransform",
            Self::Builtin(_) => "BuiltinTransform",
        }
    }

    /// Direction stored on the transform.
    pub fn direction(&self) -> TransformDirection {
        match self {
            Self::Matrix(t) => t.direction,
            Self::Range(t) => t.direction,
            Self::Log(t) => t.direction,
            Self::LogAffine(t) => t.direction,
            Self::LogCamera(t) => t.affine.direction,
            Self::Exponent(t) => t.direction,
            Self::ExponentWithLinear(t) => t.direction,
            Self::Cdl(t) => t.direction,
            Self::Lut1D(t) => t.direction,
            Self::Lut3D(t) => t.direction,
            Self::FixedFunction(t) => t.direction,
            Self::Allocation(t) => t.direction,
            Self::Group(t) => t.direction,
            Self::Builtin(t) => t.direction,
        }
    }

    /// Replaces the stored direction.
    pub fn set_direction(&mut self, direction: TransformDirection) {
        match self {
            Self::Matrix(t) => t.direction = direction,
            Self::Range(t) => t.direction = direction,
            Self::Log(t) => t.direction = direction,
            Self::LogAffine(t) => t.direction = direction,
            Self::LogCamera(t) => t.affine.direction = direction,
            Self::Exponent(t) => t.direction = direction,
            Self::ExponentWithLinear(t) => t.direction = direction,
            Self::Cdl(t) => t.direction = direction,
            Self::Lut1D(t) => t.direction = direction,
            Self::Lut3D(t) => t.direction = direction,
            Self::FixedFunction(t) => t.direction = direction,
            Self::Allocation(t) => t.direction = direction,
            Self::Group(t) => t.direction = direction,
            Self::Builtin(t) => t.direction = direction,
        }
    }

    /// Same transform in the opposite direction.
    ///
    /// Group children are left in place; lowering an inverse group walks
    /// them backwards.
    pub fn inverse(mut self) -> Self {
        let flipped = self.direction().inverse();
        self.set_direction(flipped);
        self
    }
}

macro_rules! impl_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Transform {
                fn from(t: $ty) -> Self {
                    Self::$variant(t)
                }
            }
        )*
    };
}

impl_from! {
    MatrixTransform => Matrix,
    RangeTransform => Range,
    LogTransform => Log,
    LogAffineTransform => LogAffine,
    LogCameraTransform => LogCamera,
    ExponentTransform => Exponent,
    ExponentWithLinearTransform => ExponentWithLinear,
    CdlTransform => Cdl,
    Lut1DTransform => Lut1D,
    Lut3DTransform => Lut3D,
    FixedFunctionTransform => FixedFunction,
    AllocationTransform => Allocation,
    GroupTransform => Group,
    BuiltinTransform => Builtin,
}

// ============================================================================
// Analytic transforms
// ============================================================================

/// Matrix transform: `out = M * in + offset` on RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTransform {
    /// Row-major 4x4 matrix.
    pub matrix: [f64; 16],
    /// RGBA offset.
    pub offset: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl MatrixTransform {
    /// Identity matrix.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    /// Forward matrix with offset.
    pub fn new(matrix: [f64; 16], offset: [f64; 4]) -> Self {
        Self { matrix, offset, direction: TransformDirection::Forward }
    }

    /// Expands a row-major 3x3 matrix, leaving alpha untouched.
    pub fn from_3x3(m: [f64; 9]) -> Self {
        let mut matrix = Self::IDENTITY;
        for row in 0..3 {
            matrix[row * 4..row * 4 + 3].copy_from_slice(&m[row * 3..row * 3 + 3]);
        }
        Self::new(matrix, [0.0; 4])
    }

    /// Per-channel scale.
    pub fn scale(scale: [f64; 4]) -> Self {
        let mut matrix = [0.0; 16];
        for (i, s) in scale.into_iter().enumerate() {
            matrix[i * 5] = s;
        }
        Self::new(matrix, [0.0; 4])
    }
}

impl Default for MatrixTransform {
    fn default() -> Self {
        Self::new(Self::IDENTITY, [0.0; 4])
    }
}

/// Whether a range transform clamps outside its input bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeStyle {
    /// Clamp to the output bounds.
    #[default]
    Clamp,
    /// Linear remap only; lowers to a matrix.
    NoClamp,
}

/// Range transform: linear remap of `[min_in, max_in]` onto
/// `[min_out, max_out]`.
///
/// A missing bound on both sides of an end leaves that end open.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeTransform {
    /// Lower input bound.
    pub min_in: Option<f64>,
    /// Upper input bound.
    pub max_in: Option<f64>,
    /// Lower output bound.
    pub min_out: Option<f64>,
    /// Upper output bound.
    pub max_out: Option<f64>,
    /// Clamping style.
    pub style: RangeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl RangeTransform {
    /// Fully bounded clamping range.
    pub fn new(min_in: f64, max_in: f64, min_out: f64, max_out: f64) -> Self {
        Self {
            min_in: Some(min_in),
            max_in: Some(max_in),
            min_out: Some(min_out),
            max_out: Some(max_out),
            ..Default::default()
        }
    }

    /// Sets the clamping style.
    pub fn with_style(mut self, style: RangeStyle) -> Self {
        self.style = style;
        self
    }
}

/// Pure logarithm, `log_base(x)` forward.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTransform {
    /// Log base.
    pub base: f64,
    /// Direction.
    pub direction: TransformDirection,
}

impl LogTransform {
    /// Forward log in `base`.
    pub fn new(base: f64) -> Self {
        Self { base, direction: TransformDirection::Forward }
    }
}

impl Default for LogTransform {
    fn default() -> Self {
        Self::new(2.0)
    }
}

/// Affine log:
/// `log_side_slope * log_base(lin_side_slope * x + lin_side_offset) + log_side_offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogAffineTransform {
    /// Log base.
    pub base: f64,
    /// Per-channel log side slope.
    pub log_side_slope: [f64; 3],
    /// Per-channel log side offset.
    pub log_side_offset: [f64; 3],
    /// Per-channel linear side slope.
    pub lin_side_slope: [f64; 3],
    /// Per-channel linear side offset.
    pub lin_side_offset: [f64; 3],
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for LogAffineTransform {
    fn default() -> Self {
        Self {
            base: 2.0,
            log_side_slope: [1.0; 3],
            log_side_offset: [0.0; 3],
            lin_side_slope: [1.0; 3],
            lin_side_offset: [0.0; 3],
            direction: TransformDirection::Forward,
        }
    }
}

/// Camera log: affine log above `lin_side_break`, a straight line below.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCameraTransform {
    /// Affine log parameters.
    pub affine: LogAffineTransform,
    /// Per-channel linear side break point.
    pub lin_side_break: [f64; 3],
    /// Slope of the toe; derived for continuity when `None`.
    pub linear_slope: Option<[f64; 3]>,
}

impl LogCameraTransform {
    /// Camera log with the given break and default affine terms.
    pub fn new(lin_side_break: [f64; 3]) -> Self {
        Self { affine: LogAffineTransform::default(), lin_side_break, linear_slope: None }
    }

    /// Direction, stored on the affine part.
    pub fn direction(&self) -> TransformDirection {
        self.affine.direction
    }
}

/// Treatment of negative values by exponent transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    /// Negative values clamp to zero.
    #[default]
    Clamp,
    /// Odd-symmetric extension.
    Mirror,
    /// Negative values pass through unchanged.
    PassThru,
    /// The linear segment continues below zero.
    Linear,
}

/// Power function on RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentTransform {
    /// Per-channel exponent.
    pub value: [f64; 4],
    /// Negative value handling; `Linear` is not accepted.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl ExponentTransform {
    /// Same exponent on RGB, identity alpha.
    pub fn new(gamma: f64) -> Self {
        Self { value: [gamma, gamma, gamma, 1.0], negative_style: NegativeStyle::Clamp, direction: TransformDirection::Forward }
    }
}

/// Power function with a linear segment near zero (sRGB style).
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentWithLinearTransform {
    /// Per-channel exponent.
    pub gamma: [f64; 4],
    /// Per-channel offset of the power segment.
    pub offset: [f64; 4],
    /// `Linear` or `Mirror`.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl ExponentWithLinearTransform {
    /// Same gamma and offset on RGB, identity alpha.
    pub fn new(gamma: f64, offset: f64) -> Self {
        Self {
            gamma: [gamma, gamma, gamma, 1.0],
            offset: [offset, offset, offset, 0.0],
            negative_style: NegativeStyle::Linear,
            direction: TransformDirection::Forward,
        }
    }
}

/// Clamping behavior of a CDL transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdlTransformStyle {
    /// ASC v1.2: clamps to `[0, 1]`.
    #[default]
    Asc,
    /// No clamping; negative values pass through the power unchanged.
    NoClamp,
}

/// ASC CDL transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlTransform {
    /// Per-channel slope.
    pub slope: [f64; 3],
    /// Per-channel offset.
    pub offset: [f64; 3],
    /// Per-channel power.
    pub power: [f64; 3],
    /// Saturation.
    pub saturation: f64,
    /// Clamping style.
    pub style: CdlTransformStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for CdlTransform {
    fn default() -> Self {
        Self {
            slope: [1.0; 3],
            offset: [0.0; 3],
            power: [1.0; 3],
            saturation: 1.0,
            style: CdlTransformStyle::Asc,
            direction: TransformDirection::Forward,
        }
    }
}

// ============================================================================
// Lookup tables and fixed functions
// ============================================================================

/// Per-channel 1D lookup table.
#[derive(Debug, Clone)]
pub struct Lut1DTransform {
    /// Table.
    pub lut: Lut1D,
    /// How the inverse is evaluated.
    pub inversion: LutInversionQuality,
    /// Bit depth the table values were stored at.
    pub file_out_depth: BitDepth,
    /// Direction.
    pub direction: TransformDirection,
}

impl Lut1DTransform {
    /// Forward transform over `lut`.
    pub fn new(lut: Lut1D) -> Self {
        Self {
            lut,
            inversion: LutInversionQuality::Default,
            file_out_depth: BitDepth::F32,
            direction: TransformDirection::Forward,
        }
    }
}

/// 3D lookup table.
#[derive(Debug, Clone)]
pub struct Lut3DTransform {
    /// Table; interpolation lives on it.
    pub lut: Lut3D,
    /// How the inverse is evaluated.
    pub inversion: LutInversionQuality,
    /// Direction.
    pub direction: TransformDirection,
}

impl Lut3DTransform {
    /// Forward transform over `lut`.
    pub fn new(lut: Lut3D) -> Self {
        Self { lut, inversion: LutInversionQuality::Default, direction: TransformDirection::Forward }
    }
}

/// Closed-form formula identified by style.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionTransform {
    /// Formula.
    pub style: FixedFunctionStyle,
    /// Style parameters.
    pub params: Vec<f64>,
    /// Direction.
    pub direction: TransformDirection,
}

impl FixedFunctionTransform {
    /// Forward formula with parameters.
    pub fn new(style: FixedFunctionStyle, params: impl Into<Vec<f64>>) -> Self {
        Self { style, params: params.into(), direction: TransformDirection::Forward }
    }
}

/// Shapes scene values into `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationTransform {
    /// Allocation style.
    pub allocation: Allocation,
    /// `[min, max]` or, for lg2, `[min, max, offset]`. Empty means defaults.
    pub vars: Vec<f64>,
    /// Direction.
    pub direction: TransformDirection,
}

// ============================================================================
// Composite transforms
// ============================================================================

/// Origin recorded at the head of a group's ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSource {
    /// Ops came from the file at this path.
    File(String),
    /// Ops belong to the named look.
    Look(String),
}

/// Ordered list of transforms.
#[derive(Debug, Clone, Default)]
pub struct GroupTransform {
    /// Children, applied first to last in the forward direction.
    pub transforms: Vec<Transform>,
    /// Optional origin marker.
    pub source: Option<GroupSource>,
    /// Direction.
    pub direction: TransformDirection,
}

impl GroupTransform {
    /// Forward group.
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms, source: None, direction: TransformDirection::Forward }
    }

    /// Records where the children came from.
    pub fn with_source(mut self, source: GroupSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Appends a child.
    pub fn push(&mut self, transform: impl Into<Transform>) {
        self.transforms.push(transform.into());
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the group has no children.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Transform bound to an entry of the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinTransform {
    index: usize,
    style: String,
    /// Direction.
    pub direction: TransformDirection,
}

impl BuiltinTransform {
    /// Binds to the registry entry named `style`.
    pub fn new(style: &str) -> OcioResult<Self> {
        let index = builtin_transforms::find(style)?;
        Ok(Self { index, style: builtin_transforms::style_at(index)?, direction: TransformDirection::Forward })
    }

    /// Rebinds to another registry entry.
    pub fn set_style(&mut self, style: &str) -> OcioResult<()> {
        *self = Self { direction: self.direction, ..Self::new(style)? };
        Ok(())
    }

    /// Registered style name.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Registry index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human readable description of the bound entry.
    pub fn description(&self) -> OcioResult<String> {
        builtin_transforms::description_at(self.index)
    }
}

impl Default for BuiltinTransform {
    fn default() -> Self {
        Self { index: 0, style: builtin_transforms::IDENTITY.to_string(), direction: TransformDirection::Forward }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_helpers() {
        let t = MatrixTransform::from_3x3([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(&t.matrix[4..8], &[4.0, 5.0, 6.0, 0.0]);
        assert_eq!(t.matrix[15], 1.0);

        let s = MatrixTransform::scale([2.0, 3.0, 4.0, 1.0]);
        assert_eq!([s.matrix[0], s.matrix[5], s.matrix[10], s.matrix[15]], [2.0, 3.0, 4.0, 1.0]);
        assert_eq!(MatrixTransform::default().matrix, MatrixTransform::IDENTITY);
    }

    #[test]
    fn inverse_flips_direction_only() {
        let g = Transform::group(vec![Transform::matrix(MatrixTransform::IDENTITY), LogTransform::new(10.0).into()]);
        let inv = g.inverse();
        assert_eq!(inv.direction(), TransformDirection::Inverse);
        let Transform::Group(g) = inv else { panic!("expected group") };
        assert!(matches!(g.transforms[0], Transform::Matrix(_)));
        assert_eq!(g.transforms[1].direction(), TransformDirection::Forward);
    }

    #[test]
    fn set_direction_reaches_every_kind() {
        let mut t: Transform = LogCameraTransform::new([0.01; 3]).affine.into();
        t.set_direction(TransformDirection::Inverse);
        assert_eq!(t.direction(), TransformDirection::Inverse);
        assert_eq!(t.type_name(), "LogAffineTransform");
    }

    #[test]
    fn builtin_binds_case_insensitively() {
        let t = BuiltinTransform::new("acescct_to_aces2065-1").unwrap();
        assert_eq!(t.style(), "ACEScct_to_ACES2065-1");
        assert!(!t.description().unwrap().is_empty());

        let mut t = t;
        t.direction = TransformDirection::Inverse;
        t.set_style("IDENTITY").unwrap();
        assert_eq!(t.style(), "IDENTITY");
        assert_eq!(t.direction, TransformDirection::Inverse);
    }

    #[test]
    fn unknown_builtin_is_reported() {
        let err = Transform::builtin("not-a-style").unwrap_err();
        assert!(err.to_string().contains("not-a-style"));
    }
}
