//! Built-in transform registry.
//!
//! Named, parameter-free conversions realized as fixed sequences of generic
//! ops. Gamut matrices are derived from chromaticities by `vfx-primaries`;
//! curves that have no closed-form op are baked into 1D LUTs from the
//! double-precision formulas in `vfx-transfer`.
//!
//! The registry is process-wide. It is populated on first access under a
//! mutex and only grows afterwards; registering an existing style replaces
//! that entry in place, so indices stay stable.
//!
//! # Example
//!
//! ```rust
//! use vfx_ocio::builtin_transforms;
//!
//! let index = builtin_transforms::find("acescct_to_aces2065-1")?;
//! assert_eq!(builtin_transforms::style_at(index)?, "ACEScct_to_ACES2065-1");
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;
use vfx_core::TransformDirection;
use vfx_lut::Lut1D;
use vfx_math::{AdaptationMethod, Mat3, Mat4};
use vfx_ops::{
    FixedFunctionData, FixedFunctionStyle, GammaData, GammaParams, GammaStyle, LogData, LogParams, Lut1DData,
    MatrixData, OpError, OpKind, OpParams, OpResult, OpVec, RangeData,
};
use vfx_primaries::{
    ACES_AP0, ACES_AP1, P3_D60, P3_D65, P3_DCI, REC709, REC2020, conversion_matrix, from_xyz_d65, to_xyz_d65,
};
use vfx_transfer::{acescct, adx, hlg, pq};

use crate::OcioResult;

/// Style of the always-present identity entry, registered first.
pub const IDENTITY: &str = "IDENTITY";

/// Appends the forward ops of a built-in style.
pub type BuiltinFn = fn(&mut OpVec) -> OpResult<()>;

#[derive(Clone)]
struct Entry {
    style: String,
    description: String,
    build: BuiltinFn,
}

/// Ordered list of built-in styles.
pub struct BuiltinRegistry {
    entries: Vec<Entry>,
}

impl BuiltinRegistry {
    fn with_defaults() -> Self {
        let mut registry = Self { entries: Vec::new() };
        registry.add(IDENTITY, "Identity transform", |_| Ok(()));
        register_aces(&mut registry);
        register_displays(&mut registry);
        registry
    }

    /// Adds `style`, or replaces the entry with the same name.
    pub fn add(&mut self, style: &str, description: &str, build: BuiltinFn) {
        let entry = Entry { style: style.to_string(), description: description.to_string(), build };
        match self.find(style) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Index of `style`, compared case-insensitively.
    pub fn find(&self, style: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.style.eq_ignore_ascii_case(style))
    }

    /// Number of styles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no style is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, index: usize) -> OcioResult<&Entry> {
        self.entries.get(index).ok_or_else(|| {
            OpError::UnknownStyle { context: "BuiltinTransform", name: format!("#{index}") }.into()
        })
    }
}

static REGISTRY: OnceLock<Mutex<BuiltinRegistry>> = OnceLock::new();

fn registry() -> MutexGuard<'static, BuiltinRegistry> {
    REGISTRY
        .get_or_init(|| {
            let registry = BuiltinRegistry::with_defaults();
            debug!(styles = registry.len(), "populated built-in transform registry");
            Mutex::new(registry)
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Registry index of `style` (case-insensitive).
pub fn find(style: &str) -> OcioResult<usize> {
    registry()
        .find(style)
        .ok_or_else(|| OpError::UnknownStyle { context: "BuiltinTransform", name: style.to_string() }.into())
}

/// Style name at `index`.
pub fn style_at(index: usize) -> OcioResult<String> {
    Ok(registry().entry(index)?.style.clone())
}

/// Description at `index`.
pub fn description_at(index: usize) -> OcioResult<String> {
    Ok(registry().entry(index)?.description.clone())
}

/// Number of registered styles.
pub fn count() -> usize {
    registry().len()
}

/// All style names in registration order.
pub fn styles() -> Vec<String> {
    registry().entries.iter().map(|e| e.style.clone()).collect()
}

/// Adds or replaces a style. Meant for start-up, before processors are
/// built from it.
pub fn register(style: &str, description: &str, build: BuiltinFn) {
    registry().add(style, description, build);
}

/// Appends the ops of the style at `index` in `direction`.
///
/// The inverse runs the forward builder and inverts the result.
pub fn build(ops: &mut OpVec, index: usize, direction: TransformDirection) -> OcioResult<()> {
    let build = registry().entry(index)?.build;
    let mut local = OpVec::new();
    build(&mut local)?;
    if !direction.is_forward() {
        local = local.invert()?;
    }
    ops.extend(local)?;
    Ok(())
}

// ============================================================================
// Op helpers
// ============================================================================

fn matrix(ops: &mut OpVec, m: Mat3) -> OpResult<()> {
    ops.append(OpParams::Matrix(MatrixData::from_mat3(&m)), TransformDirection::Forward)
}

fn matrix_3x3(ops: &mut OpVec, rows: [[f64; 3]; 3]) -> OpResult<()> {
    ops.append(OpParams::Matrix(MatrixData::new(Mat4::from_mat3(rows), [0.0; 4])), TransformDirection::Forward)
}

fn scale_offset(ops: &mut OpVec, scale: f64, offset: f64) -> OpResult<()> {
    let data = MatrixData::scale_offset([scale, scale, scale, 1.0], [offset, offset, offset, 0.0]);
    ops.append(OpParams::Matrix(data), TransformDirection::Forward)
}

fn range(ops: &mut OpVec, data: RangeData) -> OpResult<()> {
    ops.append(OpParams::Range(data), TransformDirection::Forward)
}

fn log(ops: &mut OpVec, data: LogData, direction: TransformDirection) -> OpResult<()> {
    ops.append(OpParams::Log(data), direction)
}

fn gamma(ops: &mut OpVec, style: GammaStyle, params: GammaParams) -> OpResult<()> {
    ops.append(OpParams::Gamma(GammaData::uniform(style, params)), TransformDirection::Forward)
}

fn fixed(ops: &mut OpVec, style: FixedFunctionStyle, params: &[f64]) -> OpResult<()> {
    ops.append(OpParams::FixedFunction(FixedFunctionData::new(style, params)), TransformDirection::Forward)
}

fn lut(ops: &mut OpVec, len: usize, f: impl Fn(f64) -> f64) -> OpResult<()> {
    let table = Lut1D::from_fn(len, f).map_err(|e| OpError::from_lut(OpKind::Lut1D, e))?;
    ops.append(OpParams::Lut1D(Lut1DData::new(table)), TransformDirection::Forward)
}

fn half_lut(ops: &mut OpVec, f: impl Fn(f64) -> f64) -> OpResult<()> {
    ops.append(OpParams::Lut1D(Lut1DData::new(Lut1D::from_fn_half(f))), TransformDirection::Forward)
}

// ============================================================================
// ACES
// ============================================================================

const BLUE_LIGHT_FIX: [[f64; 3]; 3] = [
    [0.9404372683, -0.0183068787, 0.0778696104],
    [0.0083786969, 0.8286599939, 0.1629613092],
    [0.0005471261, -0.0008833746, 1.0003362486],
];

const CDD_TO_CID: [[f64; 3]; 3] = [
    [0.75573, 0.22197, 0.02230],
    [0.05901, 0.96928, -0.02829],
    [0.16134, 0.07406, 0.76460],
];

const EXP_TO_ACES: [[f64; 3]; 3] = [
    [0.72286, 0.12630, 0.15084],
    [0.11923, 0.76418, 0.11659],
    [0.01427, 0.08213, 0.90359],
];

const RRT_SAT: [[f64; 3]; 3] = [
    [0.970889148671, 0.026963270632, 0.002147580696],
    [0.010889148671, 0.986963270632, 0.002147580696],
    [0.010889148671, 0.026963270632, 0.962147580696],
];

fn ap1_to_ap0(ops: &mut OpVec) -> OpResult<()> {
    matrix(ops, conversion_matrix(&ACES_AP1, &ACES_AP0, AdaptationMethod::None))
}

/// ACEScct as a camera log; evaluated inverse it decodes to linear.
fn acescct_log() -> LogData {
    let params = LogParams::new(1.0 / 17.52, 9.72 / 17.52, 1.0, 0.0).with_lin_break(acescct::X_BRK);
    LogData::uniform(2.0, params)
}

fn acescct_to_linear(ops: &mut OpVec) -> OpResult<()> {
    log(ops, acescct_log(), TransformDirection::Inverse)
}

fn acescct_to_aces(ops: &mut OpVec) -> OpResult<()> {
    acescct_to_linear(ops)?;
    ap1_to_ap0(ops)
}

fn acescc_to_aces(ops: &mut OpVec) -> OpResult<()> {
    use vfx_transfer::acescc::{DOMAIN_MAX, DOMAIN_MIN, decode_normalized};
    // Widen the LUT domain to the full ACEScc extent.
    range(ops, RangeData::new(DOMAIN_MIN, DOMAIN_MAX, 0.0, 1.0))?;
    lut(ops, 4096, decode_normalized)?;
    ap1_to_ap0(ops)?;
    // Clamps incoming negatives when inverted.
    range(ops, RangeData::clamp_negatives())
}

fn acesproxy_to_aces(ops: &mut OpVec) -> OpResult<()> {
    use vfx_transfer::acesproxy::{CV_MAX, CV_MIN, code_to_log2};
    range(ops, RangeData::new(CV_MIN / 1023.0, CV_MAX / 1023.0, code_to_log2(CV_MIN), code_to_log2(CV_MAX)))?;
    log(ops, LogData::log2(), TransformDirection::Inverse)?;
    ap1_to_ap0(ops)
}

fn adx_to_aces(ops: &mut OpVec, scale: f64, offset: f64) -> OpResult<()> {
    // Code values to channel dependent density, then channel independent.
    scale_offset(ops, scale, offset)?;
    matrix_3x3(ops, CDD_TO_CID)?;
    half_lut(ops, adx::density_to_log_exposure)?;
    log(ops, LogData::log10(), TransformDirection::Inverse)?;
    matrix_3x3(ops, EXP_TO_ACES)
}

fn rrt_preamble(ops: &mut OpVec) -> OpResult<()> {
    fixed(ops, FixedFunctionStyle::AcesGlow10Fwd, &[])?;
    fixed(ops, FixedFunctionStyle::AcesRedMod10Fwd, &[])?;
    range(ops, RangeData::clamp_negatives())?;
    matrix(ops, conversion_matrix(&ACES_AP0, &ACES_AP1, AdaptationMethod::None))?;
    range(ops, RangeData::clamp_negatives())?;
    matrix_3x3(ops, RRT_SAT)
}

fn register_aces(r: &mut BuiltinRegistry) {
    r.add(
        "UTILITY - ACES-AP0_to_CIE-XYZ-D65_BFD",
        "Convert ACES AP0 primaries to CIE XYZ with a D65 white point with Bradford adaptation",
        |ops| matrix(ops, to_xyz_d65(&ACES_AP0, AdaptationMethod::Bradford)),
    );
    r.add(
        "UTILITY - ACES-AP1_to_CIE-XYZ-D65_BFD",
        "Convert ACES AP1 primaries to CIE XYZ with a D65 white point with Bradford adaptation",
        |ops| matrix(ops, to_xyz_d65(&ACES_AP1, AdaptationMethod::Bradford)),
    );
    r.add(
        "UTILITY - ACES-AP1_to_LINEAR-REC709_BFD",
        "Convert ACES AP1 primaries to linear Rec.709 primaries with Bradford adaptation",
        |ops| matrix(ops, conversion_matrix(&ACES_AP1, &REC709, AdaptationMethod::Bradford)),
    );
    r.add("CURVE - ACEScct-LOG_to_LINEAR", "Apply the log-to-lin curve used in ACEScct", acescct_to_linear);
    r.add("ACEScct_to_ACES2065-1", "Convert ACEScct to ACES2065-1", acescct_to_aces);
    r.add("ACEScc_to_ACES2065-1", "Convert ACEScc to ACES2065-1", acescc_to_aces);
    r.add("ACEScg_to_ACES2065-1", "Convert ACEScg to ACES2065-1", ap1_to_ap0);
    r.add("ACESproxy10i_to_ACES2065-1", "Convert ACESproxy 10i to ACES2065-1", acesproxy_to_aces);
    r.add("ADX10_to_ACES2065-1", "Convert ADX10 to ACES2065-1", |ops| {
        adx_to_aces(ops, adx::ADX10_SCALE, adx::ADX10_OFFSET)
    });
    r.add("ADX16_to_ACES2065-1", "Convert ADX16 to ACES2065-1", |ops| {
        adx_to_aces(ops, adx::ADX16_SCALE, adx::ADX16_OFFSET)
    });
    r.add(
        "ACES-LMT - BLUE_LIGHT_ARTIFACT_FIX",
        "LMT for desaturating blue hues to reduce clipping artifacts",
        |ops| matrix_3x3(ops, BLUE_LIGHT_FIX),
    );
    r.add(
        "ACES-OUTPUT - RRT-PREAMBLE_1.0",
        "Glow, red modifier and saturation stages that open the ACES 1.0 RRT",
        rrt_preamble,
    );
}

// ============================================================================
// Displays
// ============================================================================

fn from_xyz(ops: &mut OpVec, dst: &vfx_primaries::Primaries, method: AdaptationMethod) -> OpResult<()> {
    matrix(ops, from_xyz_d65(dst, method))
}

fn pq_to_linear(ops: &mut OpVec) -> OpResult<()> {
    lut(ops, 4096, pq::eotf)
}

fn linear_to_pq(ops: &mut OpVec) -> OpResult<()> {
    half_lut(ops, pq::oetf)
}

fn xyz_to_hlg_1000(ops: &mut OpVec) -> OpResult<()> {
    const LW: f64 = 1000.0;
    const E_MAX: f64 = 3.0;
    let gamma = hlg::system_gamma(LW);
    from_xyz(ops, &REC2020, AdaptationMethod::None)?;
    scale_offset(ops, 100.0, 0.0)?;
    scale_offset(ops, E_MAX.powf(gamma) / LW, 0.0)?;
    fixed(ops, FixedFunctionStyle::Rec2100SurroundFwd, &[1.0 / gamma])?;
    half_lut(ops, |e| hlg::oetf_scaled(e, E_MAX))
}

fn register_displays(r: &mut BuiltinRegistry) {
    r.add("DISPLAY - CIE-XYZ-D65_to_REC.1886-REC.709", "Convert CIE XYZ (D65 white) to Rec.1886/Rec.709 (HD video)", |ops| {
        from_xyz(ops, &REC709, AdaptationMethod::None)?;
        gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.4))
    });
    r.add(
        "DISPLAY - CIE-XYZ-D65_to_REC.1886-REC.2020",
        "Convert CIE XYZ (D65 white) to Rec.1886/Rec.2020 (UHD video)",
        |ops| {
            from_xyz(ops, &REC2020, AdaptationMethod::None)?;
            gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.4))
        },
    );
    r.add("DISPLAY - CIE-XYZ-D65_to_G2.2-REC.709", "Convert CIE XYZ (D65 white) to Gamma2.2, Rec.709", |ops| {
        from_xyz(ops, &REC709, AdaptationMethod::None)?;
        gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.2))
    });
    r.add("DISPLAY - CIE-XYZ-D65_to_sRGB", "Convert CIE XYZ (D65 white) to sRGB (piecewise EOTF)", |ops| {
        from_xyz(ops, &REC709, AdaptationMethod::None)?;
        gamma(ops, GammaStyle::MonCurveRev, GammaParams::moncurve(2.4, 0.055))
    });
    r.add(
        "DISPLAY - CIE-XYZ-D65_to_G2.6-P3-DCI-BFD",
        "Convert CIE XYZ (D65 white) to Gamma 2.6, P3-DCI (DCI white with Bradford adaptation)",
        |ops| {
            from_xyz(ops, &P3_DCI, AdaptationMethod::Bradford)?;
            gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.6))
        },
    );
    r.add("DISPLAY - CIE-XYZ-D65_to_G2.6-P3-D65", "Convert CIE XYZ (D65 white) to Gamma 2.6, P3-D65", |ops| {
        from_xyz(ops, &P3_D65, AdaptationMethod::None)?;
        gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.6))
    });
    r.add(
        "DISPLAY - CIE-XYZ-D65_to_G2.6-P3-D60-BFD",
        "Convert CIE XYZ (D65 white) to Gamma 2.6, P3-D60 (Bradford adaptation)",
        |ops| {
            from_xyz(ops, &P3_D60, AdaptationMethod::Bradford)?;
            gamma(ops, GammaStyle::BasicRev, GammaParams::basic(2.6))
        },
    );
    r.add("CURVE - ST-2084_to_LINEAR", "Convert SMPTE ST-2084 (PQ) full-range to linear nits/100", pq_to_linear);
    r.add("CURVE - LINEAR_to_ST-2084", "Convert linear nits/100 to SMPTE ST-2084 (PQ) full-range", linear_to_pq);
    r.add("DISPLAY - CIE-XYZ-D65_to_REC.2100-PQ", "Convert CIE XYZ (D65 white) to Rec.2100-PQ", |ops| {
        from_xyz(ops, &REC2020, AdaptationMethod::None)?;
        linear_to_pq(ops)
    });
    r.add(
        "DISPLAY - CIE-XYZ-D65_to_ST2084-P3-D65",
        "Convert CIE XYZ (D65 white) to ST-2084 (PQ), P3-D65 primaries",
        |ops| {
            from_xyz(ops, &P3_D65, AdaptationMethod::None)?;
            linear_to_pq(ops)
        },
    );
    r.add(
        "DISPLAY - CIE-XYZ-D65_to_REC.2100-HLG-1000nit",
        "Convert CIE XYZ (D65 white) to Rec.2100-HLG, 1000 nit",
        xyz_to_hlg_1000,
    );
}
