use std::fmt;

use crate::backend::RenderBackend;
use crate::quality::QualityOverrides;

/// Host camera identity. Two cameras are the same camera iff their ids are equal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CameraId(pub u64);

/// Host light identity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LightId(pub u64);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera#{}", self.0)
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light#{}", self.0)
    }
}

/// Camera properties reported for diagnostics when the main camera is bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraInfo {
    pub rendering_path: String,
    pub allow_msaa: bool,
    pub allow_dynamic_resolution: bool,
}

/// Keys the pipeline can ask the host about.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    T,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
}

/// A key held together with a modifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub modifier: Modifier,
}

impl KeyChord {
    /// Held to write the composite targets to disk (Ctrl+T).
    pub const CAPTURE: KeyChord = KeyChord { key: Key::T, modifier: Modifier::Control };
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}+{:?}", self.modifier, self.key)
    }
}

/// Everything the pipeline consumes from the host application.
///
/// All calls happen on the host's render thread from inside the scene-load
/// and post-render notifications.
pub trait Host {
    type Backend: RenderBackend;

    fn backend(&mut self) -> &mut Self::Backend;

    /// Display resolution in physical pixels.
    fn screen_size(&self) -> (u32, u32);

    /// The camera the host treats as the primary viewpoint, if any.
    fn main_camera(&self) -> Option<CameraId>;

    /// All cameras in the loaded scene.
    fn cameras(&self) -> Vec<CameraId>;

    fn camera_info(&self, camera: CameraId) -> CameraInfo;

    /// Whether the camera already renders into a custom target.
    fn camera_has_target(&self, camera: CameraId) -> bool;

    fn set_camera_target(
        &mut self,
        camera: CameraId,
        target: &<Self::Backend as RenderBackend>::Target,
    );

    fn set_allow_dynamic_resolution(&mut self, camera: CameraId, allow: bool);

    fn lights(&self) -> Vec<LightId>;

    fn set_light_shadow_resolution(&mut self, light: LightId, resolution: u32);

    fn apply_quality(&mut self, overrides: &QualityOverrides);

    /// Level-triggered: true for every frame the chord is held.
    fn is_chord_pressed(&self, chord: &KeyChord) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_chord_is_ctrl_t() {
        assert_eq!(KeyChord::CAPTURE.key, Key::T);
        assert_eq!(KeyChord::CAPTURE.modifier, Modifier::Control);
        assert_eq!(KeyChord::CAPTURE.to_string(), "Control+T");
    }
}
