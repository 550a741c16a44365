//! Recording host used by the unit tests.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::{CapturedImage, PixelMatrix, PixelRect, RenderBackend, TargetDesc};
use crate::capture::CaptureSink;
use crate::error::{AllocationError, CaptureError};
use crate::host::{CameraId, CameraInfo, Host, KeyChord, LightId};
use crate::quality::QualityOverrides;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTarget {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create { id: u64, width: u32, height: u32 },
    Release { id: u64 },
    SetActive(Option<u64>),
    LoadMatrix(PixelMatrix),
    Draw { dest: PixelRect, source: u64 },
    Read { id: u64 },
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub limit: u32,
    /// Successful creations left before `create_target` fails; `None` is unlimited.
    pub create_budget: Option<usize>,
    pub fail_readback: bool,
    pub truncate_readback: bool,
    next_id: u64,
    calls: Vec<BackendCall>,
    descs: Vec<TargetDesc>,
}

impl MockBackend {
    pub fn new(limit: u32) -> Self {
        Self { limit, next_id: 1, ..Self::default() }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn created_descs(&self) -> &[TargetDesc] {
        &self.descs
    }

    pub fn created_sizes(&self) -> Vec<(u32, u32)> {
        self.descs.iter().map(|d| (d.width, d.height)).collect()
    }

    pub fn draws(&self) -> Vec<(PixelRect, u64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw { dest, source } => Some((*dest, *source)),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for MockBackend {
    type Target = MockTarget;

    fn max_target_dimension(&self) -> u32 {
        self.limit
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<MockTarget, AllocationError> {
        match self.create_budget.as_mut() {
            Some(0) => return Err(AllocationError::Device("mock device lost".into())),
            Some(left) => *left -= 1,
            None => {}
        }
        let id = self.next_id;
        self.next_id += 1;
        self.descs.push(desc.clone());
        self.calls.push(BackendCall::Create { id, width: desc.width, height: desc.height });
        Ok(MockTarget { id, width: desc.width, height: desc.height })
    }

    fn release_target(&mut self, target: MockTarget) {
        self.calls.push(BackendCall::Release { id: target.id });
    }

    fn set_active_target(&mut self, target: Option<&MockTarget>) {
        self.calls.push(BackendCall::SetActive(target.map(|t| t.id)));
    }

    fn load_pixel_matrix(&mut self, matrix: PixelMatrix) {
        self.calls.push(BackendCall::LoadMatrix(matrix));
    }

    fn draw_texture(&mut self, dest: PixelRect, source: &MockTarget) {
        self.calls.push(BackendCall::Draw { dest, source: source.id });
    }

    fn read_pixels(&mut self, target: &MockTarget) -> Result<CapturedImage, CaptureError> {
        self.calls.push(BackendCall::Read { id: target.id });
        if self.fail_readback {
            return Err(CaptureError::Readback("mock readback failure".into()));
        }
        let mut len = (target.width * target.height * 4) as usize;
        if self.truncate_readback {
            len /= 2;
        }
        Ok(CapturedImage {
            width: target.width,
            height: target.height,
            rgba: vec![0x7f; len],
        })
    }
}

pub const MAIN: CameraId = CameraId(1);
pub const OVERLAY: CameraId = CameraId(2);

#[derive(Debug)]
pub struct MockHost {
    pub backend: MockBackend,
    pub screen: (u32, u32),
    pub cameras: Vec<CameraId>,
    pub main: Option<CameraId>,
    pub camera_targets: HashMap<CameraId, u64>,
    pub dynamic_resolution: HashMap<CameraId, bool>,
    pub lights: Vec<LightId>,
    pub shadow_resolutions: HashMap<LightId, u32>,
    pub quality_applied: Vec<QualityOverrides>,
    pub chord_held: bool,
}

impl MockHost {
    /// Main camera plus one overlay camera, two lights, a 16k device limit.
    pub fn new(screen: (u32, u32)) -> Self {
        Self {
            backend: MockBackend::new(16384),
            screen,
            cameras: vec![OVERLAY, MAIN],
            main: Some(MAIN),
            camera_targets: HashMap::new(),
            dynamic_resolution: HashMap::from([(MAIN, true), (OVERLAY, true)]),
            lights: vec![LightId(10), LightId(11)],
            shadow_resolutions: HashMap::new(),
            quality_applied: Vec::new(),
            chord_held: false,
        }
    }
}

impl Host for MockHost {
    type Backend = MockBackend;

    fn backend(&mut self) -> &mut MockBackend {
        &mut self.backend
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn main_camera(&self) -> Option<CameraId> {
        self.main
    }

    fn cameras(&self) -> Vec<CameraId> {
        self.cameras.clone()
    }

    fn camera_info(&self, camera: CameraId) -> CameraInfo {
        CameraInfo {
            rendering_path: "Forward".into(),
            allow_msaa: true,
            allow_dynamic_resolution: self.dynamic_resolution.get(&camera).copied().unwrap_or(false),
        }
    }

    fn camera_has_target(&self, camera: CameraId) -> bool {
        self.camera_targets.contains_key(&camera)
    }

    fn set_camera_target(&mut self, camera: CameraId, target: &MockTarget) {
        self.camera_targets.insert(camera, target.id);
    }

    fn set_allow_dynamic_resolution(&mut self, camera: CameraId, allow: bool) {
        self.dynamic_resolution.insert(camera, allow);
    }

    fn lights(&self) -> Vec<LightId> {
        self.lights.clone()
    }

    fn set_light_shadow_resolution(&mut self, light: LightId, resolution: u32) {
        self.shadow_resolutions.insert(light, resolution);
    }

    fn apply_quality(&mut self, overrides: &QualityOverrides) {
        self.quality_applied.push(overrides.clone());
    }

    fn is_chord_pressed(&self, chord: &KeyChord) -> bool {
        *chord == KeyChord::CAPTURE && self.chord_held
    }
}

/// Records capture names without touching the filesystem.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub names: Vec<String>,
}

impl CaptureSink for RecordingSink {
    fn dump<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        target: &B::Target,
        name: &str,
    ) -> Result<PathBuf, CaptureError> {
        backend.read_pixels(target)?;
        self.names.push(name.to_string());
        Ok(PathBuf::from(format!("{name}.png")))
    }
}
