//! Test scene contents: cameras, lights and the quality state they render with.

use oversample_core::{CameraId, CameraInfo, LightId, QualityOverrides};

use oversample_engine::render::GpuTarget;

/// Shadow-map size lights start with before any override.
pub const DEFAULT_SHADOW_RESOLUTION: u32 = 1024;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CameraRole {
    /// Full-screen view of the spoke pattern.
    Main,
    /// Inset view drawn over the bottom-right corner of the display.
    Inset,
}

#[derive(Debug, Clone)]
pub struct SceneCamera {
    pub id: CameraId,
    pub role: CameraRole,
    pub info: CameraInfo,
    /// Custom destination; `None` renders to the display.
    pub target: Option<GpuTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLight {
    pub id: LightId,
    /// Position in scene space, centered on the pattern.
    pub position: [f32; 2],
    pub intensity: f32,
    pub shadow_resolution: u32,
}

/// One loaded scene. Every load gets fresh camera and light ids.
#[derive(Debug, Clone)]
pub struct Scene {
    pub generation: u64,
    /// Cameras in render order.
    pub cameras: Vec<SceneCamera>,
    pub lights: Vec<SceneLight>,
    pub quality: Option<QualityOverrides>,
}

impl Scene {
    pub fn spokes(generation: u64) -> Self {
        let base = generation * 16;
        let camera = |n: u64, role: CameraRole, allow: bool| SceneCamera {
            id: CameraId(base + n),
            role,
            info: CameraInfo {
                rendering_path: "Forward".to_string(),
                allow_msaa: allow,
                allow_dynamic_resolution: allow,
            },
            target: None,
        };

        Self {
            generation,
            cameras: vec![
                camera(1, CameraRole::Main, true),
                camera(2, CameraRole::Inset, false),
            ],
            lights: vec![
                SceneLight {
                    id: LightId(base + 8),
                    position: [-0.35, -0.2],
                    intensity: 0.9,
                    shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
                },
                SceneLight {
                    id: LightId(base + 9),
                    position: [0.4, 0.25],
                    intensity: 0.6,
                    shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
                },
            ],
            quality: None,
        }
    }

    pub fn name(&self) -> String {
        format!("spokes-{}", self.generation)
    }

    pub fn main_camera(&self) -> Option<CameraId> {
        self.cameras
            .iter()
            .find(|c| c.role == CameraRole::Main)
            .map(|c| c.id)
    }

    pub fn camera(&self, id: CameraId) -> Option<&SceneCamera> {
        self.cameras.iter().find(|c| c.id == id)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut SceneCamera> {
        self.cameras.iter_mut().find(|c| c.id == id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut SceneLight> {
        self.lights.iter_mut().find(|l| l.id == id)
    }

    /// Ring density multiplier: full detail only with the top LOD forced.
    pub fn detail(&self) -> f32 {
        match &self.quality {
            Some(q) if q.maximum_lod_level == 0 => 1.0,
            _ => 0.6,
        }
    }
}

/// Pixel viewport `(x, y, width, height)` a camera covers on a destination of
/// `size`.
pub fn viewport(role: CameraRole, size: (u32, u32)) -> (u32, u32, u32, u32) {
    match role {
        CameraRole::Main => (0, 0, size.0, size.1),
        CameraRole::Inset => {
            let w = (size.0 / 4).max(1);
            let h = (size.1 / 4).max(1);
            (size.0 - w.min(size.0), size.1 - h.min(size.1), w, h)
        }
    }
}
