//! # vfx-core
//!
//! Core numeric types shared by every crate of the color operator engine.
//!
//! - [`BitDepth`] - Nominal encodings at pipeline boundaries (8i ... 32f)
//! - [`TransformDirection`] - Forward / inverse tag carried by ops and transforms
//! - [`FormatMetadata`] - Round-trip only identity of an op (id, name, attributes)
//! - [`half_domain`] - Helpers for LUTs indexed by half-float code
//! - [`numeric`] - Quantization and cache-id formatting
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. Everything else builds on it:
//!
//! ```text
//! vfx-core (this crate)
//!    ^
//!    |
//!    +-- vfx-math (f64 matrices, adaptation, SIMD kernels)
//!    +-- vfx-lut (LUT arrays and inversion)
//!    +-- vfx-ops (op data, renderers, op graph, optimizer)
//!    +-- vfx-ocio (transforms, built-ins, processor)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vfx_core::{BitDepth, TransformDirection};
//!
//! let ratio = BitDepth::UInt10.scale_to(BitDepth::F32).unwrap();
//! assert!((ratio - 1.0 / 1023.0).abs() < 1e-15);
//! assert_eq!(TransformDirection::Forward.inverse(), TransformDirection::Inverse);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bit_depth;
pub mod direction;
pub mod error;
pub mod half_domain;
pub mod metadata;
pub mod numeric;

pub use bit_depth::BitDepth;
pub use direction::TransformDirection;
pub use error::{Error, Result};
pub use metadata::FormatMetadata;
pub use numeric::{format_sig7, quantize};
