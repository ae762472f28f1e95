//! Engine configuration.
//!
//! Controls how processors are built: the optimization level, how LUT
//! inverses are evaluated, boundary bit depths and when pixel loops go
//! parallel. Loaded from YAML; every key is optional.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::BitDepth;
//! use vfx_ocio::EngineConfig;
//! use vfx_ops::OptimizationFlags;
//!
//! let config = EngineConfig::from_yaml_str("optimization: lossless\noutput_bit_depth: 10i\n")?;
//! assert_eq!(config.optimization, OptimizationFlags::LOSSLESS);
//! assert_eq!(config.output_bit_depth, BitDepth::UInt10);
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use vfx_core::BitDepth;
use vfx_ops::{LutInversionQuality, OptimizationFlags, op_vec::DEFAULT_PARALLEL_THRESHOLD};

use crate::{OcioError, OcioResult};

/// Environment variable overriding the optimization preset.
pub const ENV_OPTIMIZATION: &str = "VFX_OPTIMIZATION";

/// Settings used when building processors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Optimizer flags, written as a preset name or a hex mask.
    pub optimization: OptimizationFlags,
    /// LUT inversion quality; `default` follows the optimization flags.
    pub lut_inversion: LutInversionQuality,
    /// Depth of the pixels handed to the processor.
    pub input_bit_depth: BitDepth,
    /// Depth of the pixels the processor returns.
    pub output_bit_depth: BitDepth,
    /// Pixel count above which evaluation is chunked across threads.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationFlags::DEFAULT,
            lut_inversion: LutInversionQuality::Default,
            input_bit_depth: BitDepth::F32,
            output_bit_depth: BitDepth::F32,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> OcioResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> OcioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OcioError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&text)
    }

    /// Defaults with the optimization preset taken from
    /// `VFX_OPTIMIZATION` when it is set.
    pub fn from_env_or_default() -> OcioResult<Self> {
        Self::default().with_optimization_override(std::env::var(ENV_OPTIMIZATION).ok().as_deref())
    }

    /// Replaces the optimization flags with a parsed preset, if given.
    pub fn with_optimization_override(mut self, value: Option<&str>) -> OcioResult<Self> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.optimization = value.parse()?;
        }
        Ok(self)
    }

    /// Serializes to YAML.
    pub fn to_yaml_string(&self) -> OcioResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Sets the optimization flags.
    pub fn with_optimization(mut self, flags: OptimizationFlags) -> Self {
        self.optimization = flags;
        self
    }

    /// Sets the LUT inversion quality.
    pub fn with_lut_inversion(mut self, quality: LutInversionQuality) -> Self {
        self.lut_inversion = quality;
        self
    }

    /// Sets both boundary bit depths.
    pub fn with_bit_depths(mut self, input: BitDepth, output: BitDepth) -> Self {
        self.input_bit_depth = input;
        self.output_bit_depth = output;
        self
    }

    /// Sets the parallel threshold in pixels.
    pub fn with_parallel_threshold(mut self, pixels: usize) -> Self {
        self.parallel_threshold = pixels;
        self
    }

    /// Rejects boundary depths no op evaluates at.
    pub fn validate(&self) -> OcioResult<()> {
        for (name, depth) in [("input_bit_depth", self.input_bit_depth), ("output_bit_depth", self.output_bit_depth)] {
            if !depth.is_supported() {
                return Err(OcioError::Config(format!("{name} {depth} is not supported")));
            }
        }
        Ok(())
    }

    /// Optimization flags with the LUT inversion override folded in.
    pub fn effective_flags(&self) -> OptimizationFlags {
        let mut flags = self.optimization;
        match self.lut_inversion {
            LutInversionQuality::Default => {}
            LutInversionQuality::Exact => flags.remove(OptimizationFlags::LUT_INV_FAST),
            LutInversionQuality::Fast => flags.insert(OptimizationFlags::LUT_INV_FAST),
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn parses_every_field() {
        let yaml = "optimization: very_lossy\n\
                    lut_inversion: exact\n\
                    input_bit_depth: 8i\n\
                    output_bit_depth: 16f\n\
                    parallel_threshold: 64\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.optimization, OptimizationFlags::VERY_LOSSY);
        assert_eq!(config.lut_inversion, LutInversionQuality::Exact);
        assert_eq!(config.input_bit_depth, BitDepth::UInt8);
        assert_eq!(config.output_bit_depth, BitDepth::F16);
        assert_eq!(config.parallel_threshold, 64);
        assert!(!config.effective_flags().contains(OptimizationFlags::LUT_INV_FAST));

        let back = EngineConfig::from_yaml_str(&config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(EngineConfig::from_yaml_str("optimization: turbo"), Err(OcioError::Yaml(_))));
        assert!(matches!(EngineConfig::from_yaml_str("colour: red"), Err(OcioError::Yaml(_))));
        assert!(matches!(EngineConfig::from_yaml_str("input_bit_depth: 14i"), Err(OcioError::Config(_))));
    }

    #[test]
    fn override_accepts_presets() {
        let config = EngineConfig::default().with_optimization_override(Some("LOSSLESS")).unwrap();
        assert_eq!(config.optimization, OptimizationFlags::LOSSLESS);
        let config = EngineConfig::default().with_optimization_override(Some("  ")).unwrap();
        assert_eq!(config.optimization, OptimizationFlags::DEFAULT);
        assert!(EngineConfig::default().with_optimization_override(Some("fastest")).is_err());
    }

    #[test]
    fn fast_inversion_sets_flag() {
        let config = EngineConfig::default()
            .with_optimization(OptimizationFlags::LOSSLESS)
            .with_lut_inversion(LutInversionQuality::Fast);
        assert!(config.effective_flags().contains(OptimizationFlags::LUT_INV_FAST));
    }
}
