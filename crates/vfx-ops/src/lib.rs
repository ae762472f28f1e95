//! # vfx-ops
//!
//! Color operators for VFX pipelines: parameter records, CPU renderers,
//! op sequences and the sequence optimizer.
//!
//! # Modules
//!
//! - [`op_data`] - The [`OpData`] record: kind, direction, parameters
//! - [`matrix`], [`range`], [`log_op`], [`gamma`], [`cdl`] - Analytic ops
//! - [`lut1d`], [`lut3d`] - Lookup table ops with exact and fast inverses
//! - [`fixed_function`] - Closed-form ACES and color model transforms
//! - [`allocation`] - Allocation record op
//! - [`op`] - An op bound to its renderer
//! - [`op_vec`] - Ordered op sequences
//! - [`optimizer`] - Fixed-point rewriting of op sequences
//!
//! # Example
//!
//! ```rust
//! use vfx_core::TransformDirection;
//! use vfx_ops::{GammaData, GammaParams, GammaStyle, OpParams, OpVec, OptimizationFlags};
//!
//! let gamma = OpParams::Gamma(GammaData::uniform(GammaStyle::BasicFwd, GammaParams::basic(2.2)));
//! let mut ops = OpVec::new();
//! ops.append(gamma.clone(), TransformDirection::Forward)?;
//! ops.append(gamma, TransformDirection::Inverse)?;
//! ops.finalize(OptimizationFlags::DEFAULT)?;
//! ops.optimize(OptimizationFlags::DEFAULT)?;
//!
//! let mut px = [0.18f32, 0.5, 0.9, 1.0];
//! ops.apply(&mut px)?;
//! assert!((px[0] - 0.18).abs() < 1e-6);
//! # Ok::<(), vfx_ops::OpError>(())
//! ```
//!
//! # Precision
//!
//! Parameters, composition and validation use `f64`. Renderers process
//! packed RGBA `f32`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod flags;

pub mod allocation;
pub mod cdl;
pub mod fixed_function;
pub mod gamma;
pub mod log_op;
pub mod lut1d;
pub mod lut3d;
pub mod matrix;
pub mod op;
pub mod op_data;
pub mod op_vec;
pub mod optimizer;
pub mod parallel;
pub mod range;

pub use allocation::{Allocation, AllocationData};
pub use cdl::{CdlData, CdlStyle};
pub use error::{OpError, OpResult};
pub use fixed_function::{FixedFunctionData, FixedFunctionStyle};
pub use flags::{LutInversionQuality, OptimizationFlags};
pub use gamma::{GammaData, GammaParams, GammaStyle};
pub use log_op::{LogData, LogParams};
pub use lut1d::Lut1DData;
pub use lut3d::Lut3DData;
pub use matrix::MatrixData;
pub use op::{Op, Renderer};
pub use op_data::{OpData, OpKind, OpParams};
pub use op_vec::OpVec;
pub use range::RangeData;
