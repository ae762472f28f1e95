//! Edge values: negatives, NaN, infinities and one-sided clamps.

use approx::assert_abs_diff_eq;
use vfx_core::TransformDirection::Forward;
use vfx_lut::Lut1D;
use vfx_ops::{GammaData, GammaParams, GammaStyle, Lut1DData, OpParams, OptimizationFlags, RangeData};

use crate::support::{run, sequence};

const HALF_MAX: f32 = 65504.0;

fn apply(op: OpParams, input: [f32; 4]) -> Vec<f32> {
    run(sequence(&[(op, Forward)]), OptimizationFlags::NONE, false, &input)
}

#[test]
fn basic_gamma_clamps_negatives() {
    let g = OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.2)));
    let out = apply(g, [-0.5, -1e-6, 0.5, 1.0]);
    assert_eq!(out[0], 0.0);
    assert_eq!(out[1], 0.0);
    assert_abs_diff_eq!(out[2], 0.5f32.powf(2.2), epsilon = 1e-6);
}

#[test]
fn lut_maps_nan_to_first_entry() {
    let lut = Lut1D::from_fn(64, |x| 0.1 + 0.8 * x).unwrap();
    let out = apply(OpParams::Lut1D(Lut1DData::new(lut)), [f32::NAN, 0.0, 1.0, 1.0]);
    assert_abs_diff_eq!(out[0], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(out[1], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(out[2], 0.9, epsilon = 1e-6);
}

#[test]
fn lut_saturates_infinities() {
    let lut = Lut1D::from_fn(64, |x| x * x).unwrap();
    let out = apply(OpParams::Lut1D(Lut1DData::new(lut)), [f32::INFINITY, f32::NEG_INFINITY, 0.5, 1.0]);
    assert_eq!(out[0], 1.0);
    assert_eq!(out[1], 0.0);
}

#[test]
fn half_lut_substitutes_half_max_for_infinities() {
    let lut = Lut1D::from_fn_half(|x| 2.0 * x);
    let out = apply(OpParams::Lut1D(Lut1DData::new(lut)), [f32::INFINITY, f32::NEG_INFINITY, 0.25, 1.0]);
    assert_abs_diff_eq!(out[0], 2.0 * HALF_MAX, epsilon = 1e-3);
    assert_abs_diff_eq!(out[1], -2.0 * HALF_MAX, epsilon = 1e-3);
    assert_abs_diff_eq!(out[2], 0.5, epsilon = 1e-6);
}

#[test]
fn min_only_range_leaves_top_open() {
    let range = OpParams::Range(RangeData::lower_clamp(0.1));
    let out = apply(range, [-3.0, 0.05, 7.5, 0.5]);
    assert_eq!(&out[..3], &[0.1, 0.1, 7.5]);
    // Alpha passes through.
    assert_eq!(out[3], 0.5);
}
