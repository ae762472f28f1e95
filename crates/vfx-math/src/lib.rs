//! # vfx-math
//!
//! Math utilities for the color operator engine.
//!
//! - [`Mat3`] / [`Vec3`] - f64 3x3 matrices and triplets for RGB/XYZ work
//! - [`Mat4`] - f64 4x4 RGBA matrices with Gauss-Jordan inversion
//! - Chromatic adaptation transforms ([`BRADFORD`], [`CAT02`])
//! - [`simd`] - `wide` based f32 kernels used by the CPU renderers
//!
//! # Design
//!
//! Parameter math and composition happen in `f64`; pixel kernels run in `f32`.
//! All matrices are **row-major** and multiply **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::Mat4;
//!
//! let m = Mat4::diagonal([2.0, 2.0, 2.0, 1.0]);
//! let inv = m.inverse().unwrap();
//! assert_eq!(inv.get(0, 0), 0.5);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod adapt;
mod mat3;
mod mat4;
mod vec3;
pub mod simd;

pub use adapt::*;
pub use mat3::*;
pub use mat4::*;
pub use vec3::*;
