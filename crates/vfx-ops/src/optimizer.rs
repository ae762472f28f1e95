//! Fixed-point optimizer over a sequence of op records.
//!
//! Each pass runs, in order:
//!
//! 1. identity removal and identity replacement
//! 2. boundary rewrites (clamps at the ends, integer input clamps)
//! 3. single-op approximations allowed by very lossy flags
//! 4. one left-to-right sweep of adjacent-pair rewrites
//!
//! Passes repeat until nothing changes or [`MAX_PASSES`] is hit. Inverse
//! LUTs evaluated on the fast path are then baked into forward LUTs and the
//! loop runs once more so the baked LUTs can fuse with their neighbours.
//!
//! Pair rewrites either replace two ops by at most one or move a scale
//! matrix right past a one-sided clamp, so a sweep always terminates. When
//! several rewrites apply to a pair the one leaving fewer ops wins, then the
//! one leaving the simplest kind.

use tracing::{debug, trace, warn};
use vfx_core::BitDepth;

use crate::matrix::MatrixData;
use crate::op_data::{OpData, OpKind, OpParams};
use crate::{OpResult, OptimizationFlags};

/// Upper bound on optimizer passes.
pub const MAX_PASSES: usize = 16;

/// Rewrites `ops` under `flags`.
///
/// `ops` must be validated with inverse directions resolved where the kind
/// allows it. `input_depth` enables the integer-input clamp rewrite.
pub fn optimize(mut ops: Vec<OpData>, flags: OptimizationFlags, input_depth: BitDepth) -> OpResult<Vec<OpData>> {
    if flags.is_empty() {
        return Ok(ops);
    }
    let before = ops.len();
    run_passes(&mut ops, flags, input_depth)?;
    if resolve_fast_inverses(&mut ops, flags)? > 0 {
        run_passes(&mut ops, flags, input_depth)?;
    }
    debug!(before, after = ops.len(), %flags, "optimized op sequence");
    Ok(ops)
}

fn run_passes(ops: &mut Vec<OpData>, flags: OptimizationFlags, input_depth: BitDepth) -> OpResult<()> {
    for pass in 0..MAX_PASSES {
        let count = ops.len();
        let mut changes = remove_identities(ops, flags);
        changes += boundary_rewrites(ops, flags, input_depth);
        changes += lossy_rewrites(ops, flags)?;
        changes += combine_pairs(ops, flags)?;
        debug!(pass, count, after = ops.len(), changes, "optimizer pass");
        if changes == 0 {
            return Ok(());
        }
    }
    warn!(passes = MAX_PASSES, ops = ops.len(), "optimizer stopped at the pass limit");
    Ok(())
}

// ============================================================================
// Single-op rewrites
// ============================================================================

fn remove_identities(ops: &mut Vec<OpData>, flags: OptimizationFlags) -> usize {
    if !flags.contains(OptimizationFlags::IDENTITY) {
        return 0;
    }
    let count = ops.len();
    ops.retain(|op| {
        let drop = op.is_no_op();
        if drop {
            trace!(kind = %op.kind(), "dropped no-op");
        }
        !drop
    });
    let mut changes = count - ops.len();

    for op in ops.iter_mut() {
        if !op.is_identity() || (op.kind() == OpKind::Gamma && !flags.contains(OptimizationFlags::IDENTITY_GAMMA)) {
            continue;
        }
        let replacement = op.identity_replacement();
        if replacement.kind().complexity_rank() < op.kind().complexity_rank()
            || (replacement.kind() == op.kind() && replacement != *op)
        {
            trace!(from = %op.kind(), to = %replacement.kind(), "replaced identity");
            *op = replacement;
            changes += 1;
        }
    }
    changes
}

fn is_clamp_only(op: &OpData) -> bool {
    matches!(&op.params, OpParams::Range(r) if r.is_identity())
}

fn boundary_rewrites(ops: &mut Vec<OpData>, flags: OptimizationFlags, input_depth: BitDepth) -> usize {
    let mut changes = 0;
    if flags.contains(OptimizationFlags::DROP_BOUNDARY_CLAMPS) {
        while ops.first().is_some_and(is_clamp_only) {
            ops.remove(0);
            trace!("dropped leading clamp");
            changes += 1;
        }
        while ops.last().is_some_and(is_clamp_only) {
            ops.pop();
            trace!("dropped trailing clamp");
            changes += 1;
        }
    }
    if flags.contains(OptimizationFlags::INT_INPUT_CLAMP)
        && let Some(i) = redundant_input_clamp(ops, input_depth)
    {
        ops.remove(i);
        trace!(index = i, "dropped clamp implied by integer input");
        changes += 1;
    }
    changes
}

/// Index of a leading clamp that integer input can never exceed.
///
/// Integer input lies in `[0, max]`; leading non-negative diagonal scales
/// without offsets keep it in `[0, max * s]`.
fn redundant_input_clamp(ops: &[OpData], input_depth: BitDepth) -> Option<usize> {
    if !input_depth.is_integer() {
        return None;
    }
    let mut hi = input_depth.max_value()?;
    for (i, op) in ops.iter().enumerate() {
        match &op.params {
            OpParams::Matrix(m) => {
                let (s, o) = m.uniform_rgb_scale()?;
                if s < 0.0 || o != 0.0 {
                    return None;
                }
                hi *= s;
            }
            OpParams::Range(r) => {
                let fits = r.is_identity()
                    && r.min_in.is_none_or(|lo| lo <= 0.0)
                    && r.max_in.is_none_or(|max| max >= hi * (1.0 - 1e-9));
                return fits.then_some(i);
            }
            _ => return None,
        }
    }
    None
}

fn lossy_rewrites(ops: &mut [OpData], flags: OptimizationFlags) -> OpResult<usize> {
    let mut changes = 0;
    for op in ops.iter_mut() {
        let params = match &op.params {
            OpParams::Cdl(c) if flags.contains(OptimizationFlags::FAST_CDL_AS_MATRIX) => match c.to_matrix() {
                Ok(m) => m.map(OpParams::Matrix),
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, "kept CDL that has no matrix form");
                    None
                }
                Err(e) => return Err(e),
            },
            OpParams::Gamma(g) if flags.contains(OptimizationFlags::APPROX_MONCURVE) => {
                g.approximate_moncurve().map(OpParams::Gamma)
            }
            _ => None,
        };
        if let Some(params) = params {
            trace!(from = %op.kind(), to = %params.kind(), "approximated op");
            op.params = params;
            changes += 1;
        }
    }
    Ok(changes)
}

// ============================================================================
// Pair rewrites
// ============================================================================

/// Ordering key of a rewrite result: fewer ops, then simpler kinds.
fn rewrite_key(out: &[OpData]) -> (usize, u8) {
    (out.len(), out.iter().map(|op| op.kind().complexity_rank()).max().unwrap_or(0))
}

fn combine_pairs(ops: &mut Vec<OpData>, flags: OptimizationFlags) -> OpResult<usize> {
    let mut changes = 0;
    let mut i = 0;
    while i + 1 < ops.len() {
        let Some(here) = try_rewrite(&ops[i], &ops[i + 1], flags)? else {
            i += 1;
            continue;
        };
        // Let an overlapping pair to the right go first when it is strictly
        // better; this pair is reconsidered on the next pass.
        if i + 2 < ops.len()
            && let Some(next) = try_rewrite(&ops[i + 1], &ops[i + 2], flags)?
            && rewrite_key(&next) < rewrite_key(&here)
        {
            i += 1;
            continue;
        }
        trace!(index = i, a = %ops[i].kind(), b = %ops[i + 1].kind(), out = here.len(), "combined pair");
        ops.splice(i..i + 2, here);
        changes += 1;
    }
    Ok(changes)
}

/// Best rewrite of a pair; a rewrite that fails on numerics keeps the pair.
fn try_rewrite(a: &OpData, b: &OpData, flags: OptimizationFlags) -> OpResult<Option<Vec<OpData>>> {
    match best_rewrite(a, b, flags) {
        Err(e) if e.is_skippable() => {
            warn!(error = %e, a = %a.kind(), b = %b.kind(), "kept pair that failed to combine");
            Ok(None)
        }
        other => other,
    }
}

fn best_rewrite(a: &OpData, b: &OpData, flags: OptimizationFlags) -> OpResult<Option<Vec<OpData>>> {
    let mut best: Option<Vec<OpData>> = None;
    for candidate in candidates(a, b, flags)? {
        if best.as_ref().is_none_or(|cur| rewrite_key(&candidate) < rewrite_key(cur)) {
            best = Some(candidate);
        }
    }
    Ok(best)
}

fn single(params: OpParams, a: &OpData, b: &OpData) -> Vec<OpData> {
    vec![OpData::new(params).with_file_depths(a.file_in_depth, b.file_out_depth)]
}

/// Every rewrite of `a` followed by `b` that `flags` allow.
fn candidates(a: &OpData, b: &OpData, flags: OptimizationFlags) -> OpResult<Vec<Vec<OpData>>> {
    let mut out = Vec::new();
    let forward = a.direction.is_forward() && b.direction.is_forward();

    if let Some(bit) = OptimizationFlags::pair_identity_bit(a.kind())
        && flags.contains(bit)
        && a.is_inverse(b)
    {
        out.push(vec![a.identity_replacement()]);
    }

    match (&a.params, &b.params) {
        (OpParams::Matrix(m1), OpParams::Matrix(m2)) if flags.contains(OptimizationFlags::COMP_MATRIX) => {
            out.push(single(OpParams::Matrix(m1.compose(m2)), a, b));
        }
        (OpParams::Range(r1), OpParams::Range(r2)) if flags.contains(OptimizationFlags::COMP_RANGE) => {
            out.push(single(OpParams::Range(r1.compose(r2)), a, b));
        }
        (OpParams::Matrix(m), OpParams::Range(r)) if flags.contains(OptimizationFlags::COMP_MATRIX_RANGE) => {
            if let Some((s, o)) = m.uniform_rgb_scale() {
                if let Some(range) = r.absorb_preceding(s, o) {
                    out.push(single(OpParams::Range(range), a, b));
                } else if let Some(range) = r.commute_preceding(s, o) {
                    // Matrices drift right past one-sided clamps so they can
                    // meet and fuse with later matrices.
                    out.push(vec![
                        OpData::new(OpParams::Range(range)).with_file_depths(a.file_in_depth, a.file_in_depth),
                        OpData::new(OpParams::Matrix(*m)).with_file_depths(a.file_in_depth, b.file_out_depth),
                    ]);
                }
            }
        }
        (OpParams::Range(r), OpParams::Matrix(m)) if flags.contains(OptimizationFlags::COMP_MATRIX_RANGE) => {
            if let Some((s, o)) = m.uniform_rgb_scale()
                && let Some(range) = r.absorb_following(s, o)
            {
                out.push(single(OpParams::Range(range), a, b));
            }
        }
        (OpParams::Gamma(g1), OpParams::Gamma(g2)) if flags.contains(OptimizationFlags::COMP_GAMMA) => {
            if let Some(g) = g1.compose(g2) {
                out.push(single(OpParams::Gamma(g), a, b));
            }
        }
        (OpParams::Log(l1), OpParams::Log(l2)) if flags.contains(OptimizationFlags::COMP_LOG) => {
            if !a.direction.is_forward()
                && b.direction.is_forward()
                && let Some(m) = l1.compose_log_to_lin_with(l2)
            {
                out.push(single(OpParams::Matrix(m), a, b));
            }
        }
        (OpParams::Lut1D(l1), OpParams::Lut1D(l2)) if forward && flags.contains(OptimizationFlags::COMP_LUT1D) => {
            if l2.domain.is_none() {
                out.push(single(OpParams::Lut1D(l1.compose(l2)?), a, b));
            }
        }
        (OpParams::Lut3D(l1), OpParams::Lut3D(l2)) if forward && flags.contains(OptimizationFlags::COMP_LUT3D) => {
            if l2.domain.is_none() {
                out.push(single(OpParams::Lut3D(l1.compose(l2)?), a, b));
            }
        }
        (OpParams::Matrix(m), OpParams::Lut1D(l))
            if forward && flags.contains(OptimizationFlags::COMP_LUT1D) && m.is_diagonal() && !m.has_alpha() =>
        {
            let mut lut = l.clone();
            lut.domain = Some(prefix(m, l.domain.as_ref()));
            out.push(single(OpParams::Lut1D(lut), a, b));
        }
        (OpParams::Matrix(m), OpParams::Lut3D(l))
            if forward && flags.contains(OptimizationFlags::COMP_LUT3D) && !m.has_alpha() =>
        {
            let mut lut = l.clone();
            lut.domain = Some(prefix(m, l.domain.as_ref()));
            out.push(single(OpParams::Lut3D(lut), a, b));
        }
        _ => {}
    }
    Ok(out)
}

fn prefix(m: &MatrixData, existing: Option<&MatrixData>) -> MatrixData {
    match existing {
        Some(p) => m.compose(p),
        None => *m,
    }
}

// ============================================================================
// Fast LUT inversion
// ============================================================================

/// Bakes inverse LUTs on the fast path into forward LUTs.
fn resolve_fast_inverses(ops: &mut [OpData], flags: OptimizationFlags) -> OpResult<usize> {
    let mut resolved = 0;
    for op in ops.iter_mut() {
        if !crate::op::uses_fast_inverse(op, flags) {
            continue;
        }
        let params = match &op.params {
            // The forward LUT's output side is this op's input side.
            OpParams::Lut1D(l) if l.domain.is_none() => OpParams::Lut1D(l.fast_inverse(op.file_in_depth)),
            OpParams::Lut3D(l) if l.domain.is_none() => match l.fast_inverse() {
                Ok(inv) => OpParams::Lut3D(inv),
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, "kept exact 3D LUT inverse");
                    continue;
                }
                Err(e) => return Err(e),
            },
            _ => continue,
        };
        trace!(kind = %op.kind(), "baked fast LUT inverse");
        op.params = params;
        op.direction = vfx_core::TransformDirection::Forward;
        resolved += 1;
    }
    Ok(resolved)
}
