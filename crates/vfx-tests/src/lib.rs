//! Cross-crate tests for the color operator engine.
//!
//! These tests drive op sequences and processors end to end: the reference
//! scenarios, the properties every op sequence must keep through
//! finalization and optimization, and the edge values renderers must
//! handle.

#[cfg(test)]
mod boundaries;
#[cfg(test)]
mod curves;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;

#[cfg(test)]
pub(crate) mod support {
    use vfx_core::TransformDirection;
    use vfx_ops::{OpParams, OpVec, OptimizationFlags};

    /// Open sequence from `(params, direction)` pairs.
    pub fn sequence(ops: &[(OpParams, TransformDirection)]) -> OpVec {
        let mut vec = OpVec::new();
        for (params, dir) in ops {
            vec.append(params.clone(), *dir).unwrap();
        }
        vec
    }

    /// Finalizes, optionally optimizes, then applies to a copy of `pixels`.
    pub fn run(mut ops: OpVec, flags: OptimizationFlags, optimize: bool, pixels: &[f32]) -> Vec<f32> {
        ops.finalize(flags).unwrap();
        if optimize {
            ops.optimize(flags).unwrap();
        }
        let mut out = pixels.to_vec();
        ops.apply(&mut out).unwrap();
        out
    }

    /// Packed RGBA ramp over `[lo, hi]` with alpha 1.
    pub fn ramp(lo: f32, hi: f32, count: usize) -> Vec<f32> {
        (0..count)
            .flat_map(|i| {
                let t = i as f32 / (count - 1) as f32;
                let v = lo + (hi - lo) * t;
                [v, lo + (hi - lo) * (1.0 - t), 0.5 * (lo + hi) + 0.1 * t, 1.0]
            })
            .collect()
    }
}
