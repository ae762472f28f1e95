//! Properties every op sequence keeps through finalization and
//! optimization.

use approx::{assert_abs_diff_eq, assert_relative_eq, assert_ulps_eq};
use vfx_core::TransformDirection::{self, Forward, Inverse};
use vfx_lut::Lut1D;
use vfx_math::Mat3;
use vfx_ops::{
    CdlData, CdlStyle, FixedFunctionData, FixedFunctionStyle, GammaData, GammaParams, GammaStyle, LogData, LogParams,
    Lut1DData, MatrixData, OpKind, OpParams, OpVec, OptimizationFlags, RangeData,
};

use crate::support::{ramp, run, sequence};

type Chain = Vec<(OpParams, TransformDirection)>;

const MIX: Mat3 = Mat3::from_rows([[0.9, 0.05, 0.05], [0.1, 0.8, 0.1], [0.0, 0.2, 0.8]]);

fn mix() -> OpParams {
    OpParams::Matrix(MatrixData::from_mat3(&MIX))
}

fn scale_offset(s: f64, o: f64) -> OpParams {
    OpParams::Matrix(MatrixData::scale_offset([s, s, s, 1.0], [o, o, o, 0.0]))
}

fn basic(style: GammaStyle, g: f64) -> OpParams {
    OpParams::Gamma(GammaData::uniform(style, GammaParams::basic(g)))
}

fn affine_log() -> OpParams {
    OpParams::Log(LogData::uniform(2.0, LogParams::new(0.25, 0.5, 1.0, 0.01)))
}

fn encode_lut() -> OpParams {
    OpParams::Lut1D(Lut1DData::new(Lut1D::from_fn(1024, |x| x.powf(1.0 / 2.2)).unwrap()))
}

fn graded_cdl(style: CdlStyle) -> OpParams {
    OpParams::Cdl(CdlData::new([1.1, 0.95, 1.02], [0.01, -0.02, 0.0], [1.2, 0.9, 1.05], 0.9, style))
}

fn round_trip(op: OpParams, flags: OptimizationFlags, input: &[f32]) -> Vec<f32> {
    run(sequence(&[(op.clone(), Forward), (op, Inverse)]), flags, false, input)
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn matrix_round_trip() {
    let m = MatrixData::new(MatrixData::from_mat3(&MIX).matrix, [0.02, -0.01, 0.03, 0.0]);
    assert!(m.compose(&m.inverse().unwrap()).is_identity());

    let input = ramp(-0.5, 2.0, 64);
    let out = round_trip(OpParams::Matrix(m), OptimizationFlags::NONE, &input);
    for (a, b) in out.iter().zip(&input) {
        assert_relative_eq!(a, b, epsilon = 1e-6, max_relative = 1e-6);
    }
}

#[test]
fn log_and_gamma_round_trip() {
    let input = ramp(0.001, 1.0, 64);
    let ops = [
        affine_log(),
        basic(GammaStyle::BasicFwd, 2.4),
        OpParams::Gamma(GammaData::uniform(GammaStyle::MonCurveFwd, GammaParams::moncurve(2.4, 0.055))),
    ];
    for op in ops {
        let out = round_trip(op, OptimizationFlags::NONE, &input);
        for (a, b) in out.iter().zip(&input) {
            assert_relative_eq!(a, b, epsilon = 1e-7, max_relative = 1e-6);
        }
    }
}

#[test]
fn lut_round_trip_exact_and_fast() {
    let input = ramp(0.0, 1.0, 97);

    let exact = round_trip(encode_lut(), OptimizationFlags::NONE, &input);
    for (a, b) in exact.iter().zip(&input) {
        assert_abs_diff_eq!(a, b, epsilon = 3e-6);
    }

    let fast = round_trip(encode_lut(), OptimizationFlags::LUT_INV_FAST, &input);
    for (a, b) in fast.iter().zip(&input) {
        assert_abs_diff_eq!(a, b, epsilon = 1.5e-2);
    }
}

// ============================================================================
// Composition
// ============================================================================

fn render(op: OpParams, input: &[f32]) -> Vec<f32> {
    run(sequence(&[(op, Forward)]), OptimizationFlags::NONE, false, input)
}

fn assert_same_render(a: OpParams, b: OpParams, input: &[f32]) {
    for (x, y) in render(a, input).iter().zip(&render(b, input)) {
        assert_ulps_eq!(x, y, max_ulps = 1);
    }
}

#[test]
fn matrix_composition_is_associative() {
    let a = MatrixData::from_mat3(&MIX);
    let b = MatrixData::scale_offset([1.5, 0.5, 2.0, 1.0], [0.1, 0.0, -0.1, 0.0]);
    let c = MatrixData::from_mat3(&MIX).inverse().unwrap();
    let left = a.compose(&b).compose(&c);
    let right = a.compose(&b.compose(&c));
    assert_same_render(OpParams::Matrix(left), OpParams::Matrix(right), &ramp(-1.0, 4.0, 50));
}

#[test]
fn range_composition_is_associative() {
    let a = RangeData::new(0.0, 1.0, 0.0, 2.0);
    let b = RangeData::new(0.5, 1.5, 0.0, 1.0);
    let c = RangeData::lower_clamp(0.25);
    let left = a.compose(&b).compose(&c);
    let right = a.compose(&b.compose(&c));
    assert_same_render(OpParams::Range(left), OpParams::Range(right), &ramp(-1.0, 2.0, 50));
}

#[test]
fn gamma_composition_is_associative() {
    let a = GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.0));
    let b = GammaData::uniform(GammaStyle::BasicRev, GammaParams::basic(1.25));
    let c = GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(1.1));
    let left = a.compose(&b).unwrap().compose(&c).unwrap();
    let right = a.compose(&b.compose(&c).unwrap()).unwrap();
    assert_same_render(OpParams::Gamma(left), OpParams::Gamma(right), &ramp(0.0, 1.0, 50));
}

// ============================================================================
// Optimizer
// ============================================================================

fn chains() -> Vec<Chain> {
    vec![
        vec![
            (graded_cdl(CdlStyle::AscFwd), Forward),
            (mix(), Forward),
            (encode_lut(), Forward),
            (OpParams::Range(RangeData::lower_clamp(0.05)), Forward),
            (scale_offset(2.0, 0.0), Forward),
        ],
        vec![
            (OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0)), Forward),
            (basic(GammaStyle::BasicFwd, 2.4), Forward),
            (basic(GammaStyle::BasicFwd, 1.2), Inverse),
            (mix(), Forward),
            (mix(), Inverse),
        ],
        vec![
            (affine_log(), Inverse),
            (affine_log(), Forward),
            (OpParams::Matrix(MatrixData::identity()), Forward),
            (scale_offset(2.0, 0.1), Forward),
        ],
        vec![
            (OpParams::FixedFunction(FixedFunctionData::style(FixedFunctionStyle::RgbToHsv)), Forward),
            (graded_cdl(CdlStyle::NoClampFwd), Forward),
            (OpParams::Cdl(CdlData::identity(CdlStyle::NoClampFwd)), Forward),
            (basic(GammaStyle::BasicFwd, 1.0), Forward),
            (OpParams::FixedFunction(FixedFunctionData::style(FixedFunctionStyle::RgbToHsv)), Inverse),
        ],
    ]
}

#[test]
fn optimizer_preserves_output() {
    let input = ramp(-0.2, 1.4, 128);
    for chain in chains() {
        let reference = run(sequence(&chain), OptimizationFlags::NONE, false, &input);
        let optimized = run(sequence(&chain), OptimizationFlags::DEFAULT, true, &input);
        for (a, b) in optimized.iter().zip(&reference) {
            assert_relative_eq!(a, b, epsilon = 1e-6, max_relative = 1e-5);
        }
    }
}

#[test]
fn optimizer_leaves_no_no_ops() {
    for flags in [OptimizationFlags::LOSSLESS, OptimizationFlags::DEFAULT, OptimizationFlags::VERY_LOSSY] {
        for chain in chains() {
            let mut ops = sequence(&chain);
            ops.finalize(flags).unwrap();
            ops.optimize(flags).unwrap();
            assert!(ops.iter().all(|op| !op.data().is_no_op()));
        }
    }
}

#[test]
fn cache_ids_track_parameters() {
    let build = |g: f64, offset: f64| {
        let mut ops = sequence(&[(basic(GammaStyle::BasicFwd, g), Forward), (scale_offset(2.0, offset), Forward)]);
        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        ops.cache_id().unwrap()
    };
    let id = build(2.2, 0.1);
    assert_eq!(id, build(2.2, 0.1));
    assert_ne!(id, build(2.200001, 0.1));
    assert_ne!(id, build(2.2, 0.1001));
}

// ============================================================================
// Inverse equivalence
// ============================================================================

fn with_inverse(chain: &Chain) -> OpVec {
    let mut ops = sequence(chain);
    let inverse = ops.invert().unwrap();
    ops.extend(inverse).unwrap();
    ops
}

#[test]
fn sequence_then_inverse_leaves_only_clamps() {
    let chains: Vec<Chain> = vec![
        vec![(scale_offset(2.0, 0.1), Forward), (affine_log(), Forward)],
        vec![(encode_lut(), Forward), (mix(), Forward)],
        vec![
            (OpParams::FixedFunction(FixedFunctionData::style(FixedFunctionStyle::RgbToHsv)), Forward),
            (graded_cdl(CdlStyle::NoClampFwd), Forward),
            (
                OpParams::Gamma(GammaData::uniform(GammaStyle::MonCurveMirrorFwd, GammaParams::moncurve(2.4, 0.055))),
                Forward,
            ),
        ],
    ];
    let input = ramp(0.0, 1.0, 64);
    for chain in &chains {
        let mut ops = with_inverse(chain);
        assert_eq!(ops.len(), 2 * chain.len());
        ops.finalize(OptimizationFlags::DEFAULT).unwrap();
        ops.optimize(OptimizationFlags::DEFAULT).unwrap();
        assert!(ops.iter().all(|op| op.kind() == OpKind::Range), "left {:?}", ops.cache_id());

        let mut out = input.clone();
        ops.apply(&mut out).unwrap();
        for (a, b) in out.iter().zip(&input) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-5);
        }
    }
}
