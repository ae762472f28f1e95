//! Benchmarks for op evaluation, optimization and processor builds.
//!
//! Run with: `cargo bench`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use vfx_core::TransformDirection::{Forward, Inverse};
use vfx_lut::{Lut1D, Lut3D};
use vfx_ocio::{EngineConfig, Processor, Transform};
use vfx_ops::{
    CdlData, CdlStyle, GammaData, GammaParams, GammaStyle, LogData, Lut1DData, Lut3DData, MatrixData, OpParams, OpVec,
    OptimizationFlags, RangeData,
};
use vfx_transfer::pq;

fn rgba_ramp(pixels: usize) -> Vec<f32> {
    (0..pixels)
        .flat_map(|i| {
            let t = i as f32 / pixels as f32;
            [t, 1.0 - t, 0.5 * t, 1.0]
        })
        .collect()
}

/// A grading chain of the usual kinds.
fn grading_chain() -> OpVec {
    let mut ops = OpVec::new();
    let steps = [
        (OpParams::Matrix(MatrixData::scale_offset([1.1, 1.0, 0.9, 1.0], [0.01, 0.0, -0.01, 0.0])), Forward),
        (OpParams::Cdl(CdlData::new([1.1, 1.0, 0.95], [0.01, 0.0, 0.0], [1.2, 1.0, 0.9], 0.9, CdlStyle::AscFwd)), Forward),
        (OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.2))), Inverse),
        (OpParams::Lut1D(Lut1DData::new(Lut1D::from_fn(4096, |x| x * x).unwrap())), Forward),
        (OpParams::Range(RangeData::new(0.0, 1.0, 0.0, 1.0)), Forward),
    ];
    for (params, dir) in steps {
        ops.append(params, dir).unwrap();
    }
    ops
}

/// Transfer curves used by the display built-ins.
fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");

    for size in [1000, 10000, 100000].iter() {
        let values: Vec<f64> = (0..*size).map(|i| i as f64 / *size as f64).collect();
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("pq_eotf", size), &values, |b, v| {
            b.iter(|| v.iter().map(|&x| pq::eotf(black_box(x))).collect::<Vec<_>>())
        });

        group.bench_with_input(BenchmarkId::new("pq_oetf", size), &values, |b, v| {
            b.iter(|| v.iter().map(|&x| pq::oetf(black_box(x))).collect::<Vec<_>>())
        });
    }

    group.finish();
}

/// LUT renderers, forward and both inverse paths.
fn bench_luts(c: &mut Criterion) {
    let mut group = c.benchmark_group("lut");
    let pixels = rgba_ramp(10000);
    group.throughput(Throughput::Elements(10000));

    let lut1d = Lut1D::from_fn(1024, |x| x.powf(1.0 / 2.2)).unwrap();
    let lut3d = Lut3D::from_fn(33, |[r, g, b]| [r * 0.9 + g * 0.1, g, b * b]).unwrap();

    for (name, params, dir, flags) in [
        ("lut1d_fwd", OpParams::Lut1D(Lut1DData::new(lut1d.clone())), Forward, OptimizationFlags::NONE),
        ("lut1d_inv_exact", OpParams::Lut1D(Lut1DData::new(lut1d.clone())), Inverse, OptimizationFlags::NONE),
        ("lut1d_inv_fast", OpParams::Lut1D(Lut1DData::new(lut1d)), Inverse, OptimizationFlags::LUT_INV_FAST),
        ("lut3d_fwd", OpParams::Lut3D(Lut3DData::new(lut3d)), Forward, OptimizationFlags::NONE),
    ] {
        let mut ops = OpVec::new();
        ops.append(params, dir).unwrap();
        ops.finalize(flags).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut px = pixels.clone();
                ops.apply(black_box(&mut px)).unwrap();
                px
            })
        });
    }

    group.finish();
}

/// Serial against chunked evaluation of the same chain.
fn bench_op_vec(c: &mut Criterion) {
    let mut group = c.benchmark_group("op_vec");

    for size in [1024usize, 65536, 1 << 20].iter() {
        let pixels = rgba_ramp(*size);
        group.throughput(Throughput::Elements(*size as u64));

        for (name, threshold) in [("serial", usize::MAX), ("parallel", 4096)] {
            let mut ops = grading_chain().with_parallel_threshold(threshold);
            ops.finalize(OptimizationFlags::DEFAULT).unwrap();
            ops.optimize(OptimizationFlags::DEFAULT).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), &pixels, |b, p| {
                b.iter(|| {
                    let mut px = p.clone();
                    ops.apply(&mut px).unwrap();
                    px
                })
            });
        }
    }

    group.finish();
}

/// Cost of the optimizer itself.
fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");

    for flags in [OptimizationFlags::LOSSLESS, OptimizationFlags::DEFAULT, OptimizationFlags::VERY_LOSSY] {
        group.bench_function(flags.to_string(), |b| {
            b.iter(|| {
                let mut ops = grading_chain();
                let inverse = ops.invert().unwrap();
                ops.extend(inverse).unwrap();
                ops.append(OpParams::Log(LogData::log2()), Forward).unwrap();
                ops.finalize(flags).unwrap();
                ops.optimize(black_box(flags)).unwrap();
                ops.len()
            })
        });
    }

    group.finish();
}

/// Processor construction from built-in transforms.
fn bench_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor");
    let config = EngineConfig::default();

    for style in ["ACEScct_to_ACES2065-1", "ADX10_to_ACES2065-1", "DISPLAY - CIE-XYZ-D65_to_REC.2100-PQ"] {
        let transform = Transform::builtin(style).unwrap();
        group.bench_function(BenchmarkId::new("build", style), |b| {
            b.iter(|| Processor::from_transform(black_box(&transform), Forward, &config).unwrap().num_ops())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transfer, bench_luts, bench_op_vec, bench_optimize, bench_processor);
criterion_main!(benches);
