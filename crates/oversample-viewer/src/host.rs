use oversample_core::{
    CameraId, CameraInfo, Host, KeyChord, LightId, QualityOverrides,
};
use oversample_engine::render::{GpuTarget, WgpuBackend};

use crate::scene::Scene;

/// The viewer as seen by the pipeline: one scene, one display, one backend.
pub struct ViewerHost {
    pub(crate) backend: WgpuBackend,
    pub(crate) scene: Scene,
    screen: (u32, u32),
    capture_chord_down: bool,
}

impl ViewerHost {
    pub fn new(backend: WgpuBackend, scene: Scene, screen: (u32, u32)) -> Self {
        Self {
            backend,
            scene,
            screen,
            capture_chord_down: false,
        }
    }

    pub fn set_screen_size(&mut self, size: (u32, u32)) {
        self.screen = size;
    }

    pub fn set_capture_chord_down(&mut self, down: bool) {
        self.capture_chord_down = down;
    }

    /// Replaces the scene. Camera bindings of the old scene go with it.
    pub fn replace_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }
}

impl Host for ViewerHost {
    type Backend = WgpuBackend;

    fn backend(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn main_camera(&self) -> Option<CameraId> {
        self.scene.main_camera()
    }

    fn cameras(&self) -> Vec<CameraId> {
        self.scene.cameras.iter().map(|c| c.id).collect()
    }

    fn camera_info(&self, camera: CameraId) -> CameraInfo {
        self.scene
            .camera(camera)
            .map(|c| c.info.clone())
            .unwrap_or_default()
    }

    fn camera_has_target(&self, camera: CameraId) -> bool {
        self.scene
            .camera(camera)
            .is_some_and(|c| c.target.is_some())
    }

    fn set_camera_target(&mut self, camera: CameraId, target: &GpuTarget) {
        match self.scene.camera_mut(camera) {
            Some(c) => c.target = Some(target.clone()),
            None => log::warn!("set_camera_target: unknown {camera}"),
        }
    }

    fn set_allow_dynamic_resolution(&mut self, camera: CameraId, allow: bool) {
        if let Some(c) = self.scene.camera_mut(camera) {
            c.info.allow_dynamic_resolution = allow;
        }
    }

    fn lights(&self) -> Vec<LightId> {
        self.scene.lights.iter().map(|l| l.id).collect()
    }

    fn set_light_shadow_resolution(&mut self, light: LightId, resolution: u32) {
        if let Some(l) = self.scene.light_mut(light) {
            l.shadow_resolution = resolution;
        }
    }

    fn apply_quality(&mut self, overrides: &QualityOverrides) {
        log::debug!(
            "quality: shadows {:?} x{} cascades, aniso {:?}, lod bias {}, max lod {}",
            overrides.shadow_resolution,
            overrides.shadow_cascades,
            overrides.anisotropic_filtering,
            overrides.lod_bias,
            overrides.maximum_lod_level,
        );
        self.scene.quality = Some(overrides.clone());
    }

    fn is_chord_pressed(&self, chord: &KeyChord) -> bool {
        *chord == KeyChord::CAPTURE && self.capture_chord_down
    }
}

