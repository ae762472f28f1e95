//! Reference inputs with known outputs, each checked with and without the
//! optimizer.

use approx::assert_abs_diff_eq;
use vfx_core::TransformDirection::{Forward, Inverse};
use vfx_ocio::{EngineConfig, Processor, Transform};
use vfx_ops::{
    CdlData, CdlStyle, GammaData, GammaParams, GammaStyle, LogData, LogParams, MatrixData, OpParams,
    OptimizationFlags, RangeData,
};

use crate::support::{run, sequence};

fn check(ops: &[(OpParams, vfx_core::TransformDirection)], input: [f32; 4], expected: [f32; 4], tol: f32) {
    for (flags, optimize) in [(OptimizationFlags::NONE, false), (OptimizationFlags::DEFAULT, true)] {
        let out = run(sequence(ops), flags, optimize, &input);
        for c in 0..4 {
            assert_abs_diff_eq!(out[c], expected[c], epsilon = tol);
        }
    }
}

#[test]
fn diagonal_matrix_scales_rgb() {
    let m = MatrixData::scale([2.0, 2.0, 2.0, 1.0]);
    check(&[(OpParams::Matrix(m), Forward)], [0.1, 0.2, 0.3, 1.0], [0.2, 0.4, 0.6, 1.0], 1e-7);
}

#[test]
fn gamma_and_its_inverse_cancel() {
    let g = OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.2)));
    check(&[(g.clone(), Forward), (g, Inverse)], [0.18, 0.5, 0.9, 1.0], [0.18, 0.5, 0.9, 1.0], 1e-6);
}

#[test]
fn unit_range_clamps() {
    let r = OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0));
    check(&[(r, Forward)], [-0.5, 0.5, 1.5, 0.8], [0.0, 0.5, 1.0, 0.8], 0.0);
}

#[test]
fn log10_of_one_is_zero() {
    let log = OpParams::Log(LogData::uniform(10.0, LogParams::new(1.0, 0.0, 1.0, 0.0)));
    check(&[(log, Forward)], [1.0; 4], [0.0, 0.0, 0.0, 1.0], 1e-7);
}

#[test]
fn identity_cdl_still_clamps() {
    let cdl = OpParams::Cdl(CdlData::new([1.0; 3], [0.0; 3], [1.0; 3], 1.0, CdlStyle::AscFwd));
    check(&[(cdl, Forward)], [-0.1, 0.5, 1.2, 1.0], [0.0, 0.5, 1.0, 1.0], 0.0);
}

#[test]
fn acescct_builtin_decodes() {
    let transform = Transform::builtin("ACEScct_to_ACES2065-1").unwrap();
    for flags in [OptimizationFlags::NONE, OptimizationFlags::LOSSLESS, OptimizationFlags::DEFAULT] {
        let config = EngineConfig::default().with_optimization(flags);
        let processor = Processor::from_transform(&transform, Forward, &config).unwrap();
        let px = processor.apply_pixel([0.5, 0.4, 0.3, 1.0]).unwrap();
        assert_abs_diff_eq!(px[0], 0.386397, epsilon = 1e-5);
        assert_abs_diff_eq!(px[1], 0.158557, epsilon = 1e-5);
        assert_abs_diff_eq!(px[2], 0.043153, epsilon = 1e-5);
        assert_abs_diff_eq!(px[3], 1.0, epsilon = 1e-7);
    }
}
