//! Op renderers and built-ins checked against the closed-form curves.

use approx::assert_relative_eq;
use vfx_core::TransformDirection::{Forward, Inverse};
use vfx_ocio::{EngineConfig, Processor, Transform};
use vfx_ops::{GammaData, GammaParams, GammaStyle, OpParams, OptimizationFlags};
use vfx_transfer::{acescc, acescct, acesproxy, srgb};

use crate::support::{run, sequence};

fn builtin(style: &str) -> Processor {
    let transform = Transform::builtin(style).unwrap();
    Processor::from_transform(&transform, Forward, &EngineConfig::default()).unwrap()
}

fn gray(p: &Processor, v: f32) -> f32 {
    p.apply_pixel([v, v, v, 1.0]).unwrap()[0]
}

#[test]
fn moncurve_matches_srgb() {
    let g = OpParams::Gamma(GammaData::uniform(GammaStyle::MonCurveFwd, GammaParams::moncurve(2.4, 0.055)));
    for v in [0.0f32, 0.02, 0.04045, 0.2, 0.5, 0.9, 1.0] {
        let px = [v, v, v, 1.0];
        let decoded = run(sequence(&[(g.clone(), Forward)]), OptimizationFlags::NONE, false, &px);
        assert_relative_eq!(decoded[0], srgb::eotf(v as f64) as f32, epsilon = 1e-6, max_relative = 1e-5);

        let encoded = run(sequence(&[(g.clone(), Inverse)]), OptimizationFlags::NONE, false, &px);
        assert_relative_eq!(encoded[0], srgb::oetf(v as f64) as f32, epsilon = 1e-6, max_relative = 1e-5);
    }
}

#[test]
fn acescct_curve_matches_closed_form() {
    let p = builtin("CURVE - ACEScct-LOG_to_LINEAR");
    for v in [0.0f32, 0.1, acescct::Y_BRK as f32, 0.3, 0.4135884, 0.7, 1.0] {
        assert_relative_eq!(gray(&p, v), acescct::decode(v as f64) as f32, epsilon = 1e-6, max_relative = 1e-5);
    }
}

// AP1 to AP0 keeps neutrals, so gray inputs follow the curve alone.

#[test]
fn acescc_builtin_follows_decode() {
    let p = builtin("ACEScc_to_ACES2065-1");
    for v in [0.0f32, 0.2, 0.4135884, 0.8, 1.2] {
        assert_relative_eq!(gray(&p, v), acescc::decode(v as f64) as f32, epsilon = 1e-5, max_relative = 1e-3);
    }
}

#[test]
fn acesproxy_builtin_follows_decode() {
    let p = builtin("ACESproxy10i_to_ACES2065-1");
    for code in [64.0f64, 300.0, 425.0, 600.0, 940.0, 1000.0] {
        let v = code / 1023.0;
        assert_relative_eq!(gray(&p, v as f32), acesproxy::decode(v) as f32, epsilon = 1e-6, max_relative = 1e-4);
    }
}
