//! # vfx-lut
//!
//! Look-Up Table (LUT) arrays, kernels and inversion for the color engine.
//!
//! # LUT Types
//!
//! - [`Lut1D`] - per-channel curves on a [0, 1] grid or on every half code
//! - [`Lut3D`] - full RGB lattice, blue fastest
//!
//! # Inversion
//!
//! - [`InvLut1D`] - exact inverse of a monotonic (or flattened) 1D LUT
//! - [`InvLut3D`] - exact inverse of a 3D LUT through tetrahedral search
//! - [`make_fast_inverse`] / [`make_fast_inverse_3d`] - inverse baked into
//!   a forward LUT
//!
//! # Usage
//!
//! ```rust
//! use vfx_lut::{InvLut1D, Lut1D};
//!
//! let lut = Lut1D::from_fn(1024, |x| x.powf(2.2)).unwrap();
//! let y = lut.eval(0, 0.5);
//!
//! let inv = InvLut1D::new(&lut);
//! assert!((inv.eval(0, y) - 0.5).abs() < 1e-5);
//! ```
//!
//! # Interpolation
//!
//! - 1D LUTs: nearest or linear, between grid entries or between half codes
//! - 3D LUTs: nearest, trilinear or tetrahedral
//!
//! # Dependencies
//!
//! - [`vfx-core`] - Half-float domain helpers, bit depths
//! - [`vfx-math`] - 3x3 solves for the tetrahedral inverse
//! - [`thiserror`] - Error handling
//!
//! # Used By
//!
//! - `vfx-ops` - Lut1D/Lut3D op data and renderers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod interp;
pub mod inverse1d;
pub mod inverse3d;
pub mod lut1d;
pub mod lut3d;

pub use error::{LutError, LutResult};
pub use interp::Interpolation;
pub use inverse1d::{ComponentProperties, InvLut1D, make_fast_inverse};
pub use inverse3d::{InvLut3D, make_fast_inverse_3d};
pub use lut1d::Lut1D;
pub use lut3d::Lut3D;
