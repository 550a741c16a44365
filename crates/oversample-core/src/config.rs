//! Configuration file and the per-scene sampling parameters derived from it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::allocator::size_for;
use crate::error::ConfigError;

const FILE_HEADER: &str = "\
# oversample configuration
#
# [general]
# override_quality_settings    override basic quality settings to the maximum
# shadow_resolution            fixed per-light shadow resolution, 0 = unchanged
# sampling_factor              [EXPERIMENTAL] main camera sampling factor in percent
#                              of side length (100 = unchanged, 200 = 4x pixels, ...)
# enable_render_target_dumping write render targets to disk while Ctrl+T is held
#                              (only works with sampling_factor != 100)

";

/// Settings read at every scene load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OversampleConfig {
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub override_quality_settings: bool,
    pub shadow_resolution: u32,
    pub sampling_factor: u32,
    pub enable_render_target_dumping: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            override_quality_settings: true,
            shadow_resolution: 0,
            sampling_factor: 100,
            enable_render_target_dumping: false,
        }
    }
}

impl OversampleConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads `path`, or writes the defaults there when it does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let src = fs::read_to_string(path)?;
            return Self::from_toml_str(&src);
        }

        let config = Self::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = format!("{FILE_HEADER}{}", config.to_toml_string()?);
        fs::write(path, body)?;
        log::info!("wrote default configuration to {}", path.display());
        Ok(config)
    }

    pub fn log_summary(&self) {
        let g = &self.general;
        log::info!("overrideQualitySettings: {}", g.override_quality_settings);
        log::info!("shadowResolution: {}", g.shadow_resolution);
        log::info!("samplingFactor: {}", g.sampling_factor);
        log::info!("enableRenderTargetDumping: {}", g.enable_render_target_dumping);
        if g.sampling_factor < 100 {
            log::warn!(
                "samplingFactor {} is below 100; supersampling stays disabled",
                g.sampling_factor
            );
        }
    }
}

/// Sampling parameters for one scene. Re-derived on every scene load.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SamplingConfig {
    pub base_width: u32,
    pub base_height: u32,
    /// Always >= 100; 100 means the pipeline is inert.
    pub factor_percent: u32,
}

impl SamplingConfig {
    pub fn new(base: (u32, u32), factor_percent: u32) -> Self {
        Self {
            base_width: base.0,
            base_height: base.1,
            factor_percent: factor_percent.max(100),
        }
    }

    pub fn from_config(config: &OversampleConfig, base: (u32, u32)) -> Self {
        Self::new(base, config.general.sampling_factor)
    }

    #[inline]
    pub fn base(&self) -> (u32, u32) {
        (self.base_width, self.base_height)
    }

    /// True when targets are allocated and the camera is redirected.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.factor_percent > 100
    }

    /// True when the composite goes through the 2x intermediate target.
    #[inline]
    pub fn needs_secondary(&self) -> bool {
        self.factor_percent > 200
    }

    pub fn primary_size(&self) -> (u32, u32) {
        size_for(self.base(), self.factor_percent)
    }

    /// Fixed at twice the base resolution, whatever the factor.
    pub fn secondary_size(&self) -> Option<(u32, u32)> {
        self.needs_secondary().then(|| size_for(self.base(), 200))
    }
}
