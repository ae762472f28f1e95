//! # vfx-transfer
//!
//! Closed-form transfer curves in double precision.
//!
//! Built-in transforms that have no exact op representation are baked into
//! 1D LUTs by sampling these curves, and a few fixed functions evaluate them
//! directly. Everything here is scalar `f64 -> f64`; the LUT sampler narrows
//! to `f32` once, at bake time.
//!
//! # Terminology
//!
//! - **OETF** (Opto-Electronic Transfer Function): Linear -> Encoded
//! - **EOTF** (Electro-Optical Transfer Function): Encoded -> Linear
//!
//! # Curves
//!
//! | Module | Use Case | Linear unit |
//! |--------|----------|-------------|
//! | [`pq`] | SMPTE ST 2084 (HDR10) | nits / 100 |
//! | [`hlg`] | ITU-R BT.2100 HLG | scene relative |
//! | [`srgb`] | IEC 61966-2-1 | [0, 1] |
//! | [`acescc`] | ACEScc grading log | scene linear |
//! | [`acescct`] | ACEScct grading log with toe | scene linear |
//! | [`acesproxy`] | ACESproxy 10-bit | scene linear |
//! | [`adx`] | ADX film density to log exposure | log10 exposure |
//!
//! # Usage
//!
//! ```rust
//! use vfx_transfer::pq;
//!
//! // 100 nits is 1.0 in nits/100
//! let signal = pq::oetf(1.0);
//! assert!((pq::eotf(signal) - 1.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod acescc;
pub mod acescct;
pub mod acesproxy;
pub mod adx;
pub mod hlg;
pub mod pq;
pub mod srgb;

pub use acescc::{decode as acescc_decode, encode as acescc_encode};
pub use acescct::{decode as acescct_decode, encode as acescct_encode};
pub use hlg::{eotf as hlg_eotf, oetf as hlg_oetf};
pub use pq::{eotf as pq_eotf, oetf as pq_oetf};
pub use srgb::{eotf as srgb_eotf, oetf as srgb_oetf};
