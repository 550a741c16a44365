//! One-shot quality-setting overrides applied at scene load.

/// Global shadow-map resolution tier.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShadowResolution {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AnisotropicFiltering {
    Disable,
    Enable,
    ForceEnable,
}

/// Quality settings written to the host when overrides are enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityOverrides {
    pub shadow_resolution: ShadowResolution,
    pub shadow_cascades: u32,
    pub anisotropic_filtering: AnisotropicFiltering,
    pub lod_bias: f32,
    pub maximum_lod_level: u32,
}

impl QualityOverrides {
    /// Everything at its highest setting.
    pub fn maximum() -> Self {
        Self {
            shadow_resolution: ShadowResolution::VeryHigh,
            shadow_cascades: 4,
            anisotropic_filtering: AnisotropicFiltering::ForceEnable,
            lod_bias: 100.0,
            maximum_lod_level: 0,
        }
    }
}

impl Default for QualityOverrides {
    fn default() -> Self {
        Self::maximum()
    }
}
