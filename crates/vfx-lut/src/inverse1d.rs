//! Inversion of 1D LUTs.
//!
//! # Exact inverse
//!
//! [`InvLut1D`] preconditions a forward LUT once, then answers every query
//! with a binary search:
//!
//! 1. Each channel is classified increasing or decreasing by comparing its
//!    first and last entries (entry 0 and +1.0 for half domains).
//! 2. Reversals against that direction are flattened so the curve becomes
//!    monotonic.
//! 3. Flat runs at both ends are trimmed into an effective domain
//!    `[start, end]`, so an input equal to a plateau value inverts to the
//!    plateau edge nearest the centre of the LUT.
//!
//! Decreasing curves are searched on negated values. Half-domain LUTs keep
//! two tables, one for positive codes and one for negative codes, and pick
//! one per input by comparing it with the value at +0.
//!
//! # Fast inverse
//!
//! [`make_fast_inverse`] bakes the exact inverse into a new forward LUT on a
//! domain chosen from the file output depth of the forward LUT.

use crate::Lut1D;
use crate::lut1d::MAX_LENGTH;
use vfx_core::BitDepth;
use vfx_core::half_domain::{self, NEG_ZERO, POS_HALF_MAX, POS_ONE};

/// Last positive code searched, +65504.
const POS_END_CODE: usize = POS_HALF_MAX as usize;
/// Last code flattened on the positive side, +inf.
const POS_FLATTEN_END: usize = 0x7C00;
/// First negative code, -0.
const NEG_START_CODE: usize = NEG_ZERO as usize;
/// Last negative code searched, -65504.
const NEG_END_CODE: usize = 0xFBFF;
/// Last code flattened on the negative side, -inf.
const NEG_FLATTEN_END: usize = 0xFC00;

/// Monotonicity and effective domain of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentProperties {
    /// Channel increases with its input.
    pub increasing: bool,
    /// First entry of the effective domain.
    pub start: usize,
    /// Last entry of the effective domain.
    pub end: usize,
    /// First negative-side entry (half domain only).
    pub neg_start: usize,
    /// Last negative-side entry (half domain only).
    pub neg_end: usize,
}

/// Exact inverse of a 1D LUT.
#[derive(Debug, Clone)]
pub struct InvLut1D {
    /// Per-channel search tables, sign-adjusted so each searched range is
    /// ascending.
    tables: [Vec<f32>; 3],
    props: [ComponentProperties; 3],
    /// Value at +0 per channel, splitting the half domain.
    bisect: [f32; 3],
    half_domain: bool,
    len: usize,
}

impl InvLut1D {
    /// Preconditions `forward` for inversion.
    pub fn new(forward: &Lut1D) -> Self {
        let len = forward.len();
        let half = forward.is_half_domain();
        let mut tables: [Vec<f32>; 3] = Default::default();
        let mut props = [ComponentProperties::default(); 3];
        let mut bisect = [0.0f32; 3];

        for c in 0..3 {
            let mut v: Vec<f32> = (0..len).map(|i| forward.value(i, c)).collect();
            let p = if half {
                precondition_half(&mut v)
            } else {
                precondition_standard(&mut v)
            };

            let flip = if p.increasing { 1.0 } else { -1.0 };
            for (i, x) in v.iter_mut().enumerate() {
                // negative codes run the opposite way
                let sign = if half && i >= NEG_START_CODE { -flip } else { flip };
                *x *= sign;
            }

            bisect[c] = forward.value(0, c);
            props[c] = p;
            tables[c] = v;
        }

        Self { tables, props, bisect, half_domain: half, len }
    }

    /// Properties computed for channel `c`.
    pub fn properties(&self, c: usize) -> ComponentProperties {
        self.props[c]
    }

    /// Inverts channel `c` at `y`. NaN is treated as 0.
    pub fn eval(&self, c: usize, y: f32) -> f32 {
        let y = if y.is_nan() { 0.0 } else { y };
        let p = &self.props[c];
        let table = &self.tables[c];
        let flip = if p.increasing { 1.0 } else { -1.0 };

        if !self.half_domain {
            let (idx, delta) = search(table, p.start, p.end, y * flip);
            return (idx as f32 + delta) / (self.len - 1) as f32;
        }

        let (start, end, sign) = if p.increasing == (y >= self.bisect[c]) {
            (p.start, p.end, flip)
        } else {
            (p.neg_start, p.neg_end, -flip)
        };
        let (idx, delta) = search(table, start, end, y * sign);
        let lo = half_domain::code_to_f32(idx as u16);
        if delta == 0.0 {
            return lo;
        }
        let hi = half_domain::code_to_f32(idx as u16 + 1);
        lo + delta * (hi - lo)
    }

    /// Inverts an RGB triple.
    #[inline]
    pub fn apply_rgb(&self, rgb: [f32; 3]) -> [f32; 3] {
        [self.eval(0, rgb[0]), self.eval(1, rgb[1]), self.eval(2, rgb[2])]
    }

    /// Inverts packed RGBA pixels in place; alpha passes through.
    pub fn apply_rgba(&self, pixels: &mut [f32]) {
        for px in pixels.chunks_exact_mut(4) {
            let out = self.apply_rgb([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        }
    }
}

/// Searches the ascending range `table[start..=end]` for `cv`.
///
/// Returns the lower entry index and the fraction towards the next one.
/// Values outside the range clamp to its ends; flat spots give a zero
/// fraction.
fn search(table: &[f32], start: usize, end: usize, cv: f32) -> (usize, f32) {
    let cv = cv.max(table[start]).min(table[end]);
    let mut lo = start + table[start..end].partition_point(|&x| x < cv);
    if lo > start {
        lo -= 1;
    }
    let hi = if lo < end { lo + 1 } else { lo };
    let delta = if table[hi] > table[lo] {
        (cv - table[lo]) / (table[hi] - table[lo])
    } else {
        0.0
    };
    (lo, delta)
}

/// Flattens reversals in `v[from..=to]` against `increasing`, seeding the
/// comparison with `prev`.
fn flatten(v: &mut [f32], from: usize, to: usize, increasing: bool, mut prev: f32) {
    for x in &mut v[from..=to] {
        if increasing != (*x > prev) {
            *x = prev;
        } else {
            prev = *x;
        }
    }
}

/// Trims flat runs at both ends of `v[first..=last]`.
fn effective_domain(v: &[f32], first: usize, last: usize) -> (usize, usize) {
    let mut end = last;
    while end > first && v[end - 1] == v[last] {
        end -= 1;
    }
    let mut start = first;
    while start < end && v[start + 1] == v[first] {
        start += 1;
    }
    (start, end)
}

fn precondition_standard(v: &mut [f32]) -> ComponentProperties {
    let last = v.len() - 1;
    let increasing = v[0] < v[last];
    let first = v[0];
    flatten(v, 1, last, increasing, first);
    let (start, end) = effective_domain(v, 0, last);
    ComponentProperties { increasing, start, end, neg_start: 0, neg_end: 0 }
}

fn precondition_half(v: &mut [f32]) -> ComponentProperties {
    let increasing = v[0] < v[POS_ONE as usize];
    let zero = v[0];
    flatten(v, 1, POS_FLATTEN_END, increasing, zero);
    flatten(v, NEG_START_CODE, NEG_FLATTEN_END, !increasing, zero);

    let (start, end) = effective_domain(v, 0, POS_END_CODE);
    let (neg_start, neg_end) = effective_domain(v, NEG_START_CODE, NEG_END_CODE);
    ComponentProperties { increasing, start, end, neg_start, neg_end }
}

/// Bit depth that sets the resolution of a fast inverse.
///
/// Depths without a useful integer resolution fall back to 12 bits, and a
/// forward LUT with values outside [0, 1] always needs a half domain.
pub fn fast_inverse_depth(forward: &Lut1D, file_out_depth: BitDepth) -> BitDepth {
    if forward.has_extended_range() {
        return BitDepth::F16;
    }
    match file_out_depth {
        BitDepth::Unknown | BitDepth::UInt14 | BitDepth::UInt32 => BitDepth::UInt12,
        d => d,
    }
}

/// Identity domain on which a fast inverse is sampled.
pub fn lookup_domain(depth: BitDepth) -> Lut1D {
    match depth.max_value() {
        Some(max) if depth.is_integer() && (max as usize) < MAX_LENGTH => {
            // size >= 256 so construction cannot fail
            Lut1D::identity(max as usize + 1).unwrap_or_else(|_| Lut1D::identity_half())
        }
        _ => Lut1D::identity_half(),
    }
}

/// Bakes the exact inverse of `forward` into a forward LUT.
///
/// ```rust
/// use vfx_core::BitDepth;
/// use vfx_lut::{Lut1D, make_fast_inverse};
///
/// let fwd = Lut1D::from_fn(1024, |x| x * x).unwrap();
/// let inv = make_fast_inverse(&fwd, BitDepth::UInt10);
/// assert_eq!(inv.len(), 1024);
/// assert!((inv.eval(0, 0.25) - 0.5).abs() < 1e-3);
/// ```
pub fn make_fast_inverse(forward: &Lut1D, file_out_depth: BitDepth) -> Lut1D {
    let depth = fast_inverse_depth(forward, file_out_depth);
    let mut lut = lookup_domain(depth);
    let inv = InvLut1D::new(forward);
    for v in lut.values_mut().chunks_exact_mut(3) {
        let out = inv.apply_rgb([v[0], v[1], v[2]]);
        v.copy_from_slice(&out);
    }
    lut
}
