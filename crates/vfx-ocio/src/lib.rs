//! Transforms, built-in conversions and processors for the VFX color engine.
//!
//! This crate is the user-facing layer over `vfx-ops`:
//! - Describe conversions with [`Transform`] values
//! - Look up named conversions in the [`builtin_transforms`] registry
//! - Compile transforms into an optimized [`Processor`]
//! - Control compilation with an [`EngineConfig`]
//!
//! # Quick Start
//!
//! ```
//! use vfx_core::TransformDirection;
//! use vfx_ocio::{EngineConfig, Processor, Transform};
//!
//! let transform = Transform::builtin("ACEScct_to_ACES2065-1")?;
//! let processor = Processor::from_transform(&transform, TransformDirection::Forward, &EngineConfig::default())?;
//!
//! let aces = processor.apply_pixel([0.5, 0.4, 0.3, 1.0])?;
//! assert!((aces[0] - 0.386397).abs() < 1e-5);
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```
//!
//! # Building transforms
//!
//! ```
//! use vfx_core::TransformDirection;
//! use vfx_ocio::{CdlTransform, EngineConfig, GroupTransform, LogTransform, Processor};
//!
//! let mut group = GroupTransform::new(Vec::new());
//! group.push(CdlTransform { slope: [1.1, 1.0, 0.9], ..Default::default() });
//! group.push(LogTransform::new(2.0));
//!
//! let processor = Processor::from_transform(&group.into(), TransformDirection::Inverse, &EngineConfig::default())?;
//! assert_eq!(processor.num_ops(), 2);
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;

pub mod builder;
pub mod builtin_transforms;
pub mod config;
pub mod processor;
pub mod transform;

pub use config::{ENV_OPTIMIZATION, EngineConfig};
pub use error::{OcioError, OcioResult};
pub use processor::Processor;
pub use transform::{
    AllocationTransform, BuiltinTransform, CdlTransform, CdlTransformStyle, ExponentTransform,
    ExponentWithLinearTransform, FixedFunctionTransform, GroupSource, GroupTransform, LogAffineTransform,
    LogCameraTransform, LogTransform, Lut1DTransform, Lut3DTransform, MatrixTransform, NegativeStyle, RangeStyle,
    RangeTransform, Transform,
};
