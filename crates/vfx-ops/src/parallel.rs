//! Chunked evaluation of a finalized op chain over packed RGBA pixels.
//!
//! Pixels are independent, so the buffer is cut into pixel-aligned chunks
//! and each chunk runs the whole chain in order. With the `parallel`
//! feature chunks go to the rayon pool; without it they run in sequence.
//! Either way every pixel sees exactly the same arithmetic.

use crate::op::Op;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pixels per chunk handed to one worker.
pub const CHUNK_PIXELS: usize = 1024;

/// Runs `chain` over `pixels`, on the rayon pool when there are more than
/// `threshold` pixels. Ops without a renderer are skipped, so callers
/// check finalization first.
pub fn apply_chain(chain: &[Op], pixels: &mut [f32], threshold: usize) {
    let count = pixels.len() / 4;
    if chain.is_empty() || count == 0 {
        return;
    }
    if count > threshold {
        apply_chunks(chain, pixels);
    } else {
        run(chain, pixels);
    }
}

#[inline]
fn run(chain: &[Op], chunk: &mut [f32]) {
    for renderer in chain.iter().filter_map(Op::renderer) {
        renderer.apply(chunk);
    }
}

#[cfg(feature = "parallel")]
fn apply_chunks(chain: &[Op], pixels: &mut [f32]) {
    pixels.par_chunks_mut(CHUNK_PIXELS * 4).for_each(|chunk| run(chain, chunk));
}

#[cfg(not(feature = "parallel"))]
fn apply_chunks(chain: &[Op], pixels: &mut [f32]) {
    pixels.chunks_mut(CHUNK_PIXELS * 4).for_each(|chunk| run(chain, chunk));
}
