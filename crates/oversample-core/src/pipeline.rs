//! Camera redirection and the per-frame composite blit chain.

use std::path::PathBuf;

use crate::allocator::TargetAllocator;
use crate::backend::{PixelMatrix, PixelRect, RenderBackend};
use crate::capture::{capture_file_name, CaptureSink, CaptureStage};
use crate::config::SamplingConfig;
use crate::error::AllocationError;
use crate::host::{CameraId, Host, KeyChord};

type TargetOf<H> = <<H as Host>::Backend as RenderBackend>::Target;

/// A GPU render target and the size it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget<T> {
    pub width: u32,
    pub height: u32,
    pub handle: T,
}

/// Per-scene pipeline state. Exactly one exists while a scene is loaded.
#[derive(Debug)]
pub struct PipelineState<T> {
    sampling: SamplingConfig,
    primary: Option<RenderTarget<T>>,
    secondary: Option<RenderTarget<T>>,
    frame_counter: u64,
    capture_armed: bool,
    bind_failed: bool,
}

impl<T> PipelineState<T> {
    pub fn new(sampling: SamplingConfig) -> Self {
        Self {
            sampling,
            primary: None,
            secondary: None,
            frame_counter: 0,
            capture_armed: false,
            bind_failed: false,
        }
    }

    pub fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    pub fn primary(&self) -> Option<&RenderTarget<T>> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&RenderTarget<T>> {
        self.secondary.as_ref()
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Hotkey state sampled by the most recent composite.
    pub fn capture_armed(&self) -> bool {
        self.capture_armed
    }

    /// True once target allocation failed for this scene; no retries follow.
    pub fn bind_failed(&self) -> bool {
        self.bind_failed
    }

    /// Hands the scene's targets back to the backend.
    pub fn release<B: RenderBackend<Target = T>>(self, backend: &mut B) {
        for target in [self.primary, self.secondary].into_iter().flatten() {
            log::debug!("releasing {}x{} render target", target.width, target.height);
            backend.release_target(target.handle);
        }
    }
}

/// Result of one composite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameComposite {
    pub frame: u64,
    /// Width of the final rectangle drawn onto the display.
    pub blit_width: u32,
    /// Files written this frame.
    pub captures: Vec<PathBuf>,
}

/// Width of the final display blit for `sampling`.
///
/// `base_width / 2` after the 2x intermediate stage, otherwise the base width
/// scaled inversely by the factor.
pub fn final_blit_width(sampling: &SamplingConfig) -> u32 {
    if sampling.needs_secondary() {
        sampling.base_width / 2
    } else {
        let w = u64::from(sampling.base_width) * 100 / u64::from(sampling.factor_percent);
        u32::try_from(w).unwrap_or(u32::MAX)
    }
}

/// Redirects the main camera into an oversized target and composites the
/// result back onto the display after every frame.
#[derive(Debug)]
pub struct CompositePipeline<S> {
    sink: S,
    allocator: TargetAllocator,
    dumping_enabled: bool,
}

impl<S: CaptureSink> CompositePipeline<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            allocator: TargetAllocator::new(),
            dumping_enabled: false,
        }
    }

    pub fn set_dumping_enabled(&mut self, enabled: bool) {
        self.dumping_enabled = enabled;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn allocator(&self) -> &TargetAllocator {
        &self.allocator
    }

    /// Points the host's main camera at the scene's primary target.
    ///
    /// Cameras other than the main camera are skipped, as is a main camera
    /// that already renders into a custom target. On allocation failure the
    /// camera is left untouched and the scene is not retried.
    pub fn bind<H: Host>(
        &mut self,
        host: &mut H,
        state: &mut PipelineState<TargetOf<H>>,
    ) -> Result<Option<CameraId>, AllocationError> {
        if !state.sampling.is_active() {
            return Ok(None);
        }

        let main = host.main_camera();
        let mut bound = None;

        for camera in host.cameras() {
            if Some(camera) != main {
                log::info!("    -> Skipping camera {camera}");
                continue;
            }

            let info = host.camera_info(camera);
            log::info!("    -> Rendering path: {}", info.rendering_path);
            log::info!("    -> MSAA: {}", info.allow_msaa);
            log::info!("    -> Dynamic resolution: {}", info.allow_dynamic_resolution);

            if host.camera_has_target(camera) {
                log::info!("    -> {camera} already renders into a custom target; left as is");
                continue;
            }
            if state.bind_failed {
                continue;
            }

            if let Err(e) = self.allocate_targets(host.backend(), state) {
                state.bind_failed = true;
                return Err(e);
            }
            let Some(primary) = state.primary.as_ref() else {
                continue;
            };

            host.set_camera_target(camera, &primary.handle);
            // Dynamic resolution would fight the fixed supersampled size.
            host.set_allow_dynamic_resolution(camera, false);
            bound = Some(camera);
        }

        Ok(bound)
    }

    fn allocate_targets<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        state: &mut PipelineState<B::Target>,
    ) -> Result<(), AllocationError> {
        let sampling = state.sampling;

        let (w, h) = sampling.primary_size();
        let created_primary =
            self.allocator
                .ensure(backend, &mut state.primary, "oversample primary target", (w, h))?;
        if created_primary {
            log::info!("    -> Created new target texture with resolution {w}x{h}");
        }

        let Some((sw, sh)) = sampling.secondary_size() else {
            return Ok(());
        };
        match self.allocator.ensure(
            backend,
            &mut state.secondary,
            "oversample secondary target",
            (sw, sh),
        ) {
            Ok(true) => {
                log::info!("    -> >200 scale, created secondary target texture with resolution {sw}x{sh}");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                if created_primary {
                    if let Some(primary) = state.primary.take() {
                        backend.release_target(primary.handle);
                    }
                }
                Err(e)
            }
        }
    }

    /// Composites the primary target onto the display after `camera` rendered.
    ///
    /// A no-op for cameras other than the main camera and while no primary
    /// target exists. Leaves the display as the active target on every path.
    pub fn composite<H: Host>(
        &mut self,
        host: &mut H,
        state: &mut PipelineState<TargetOf<H>>,
        camera: CameraId,
    ) -> Option<FrameComposite> {
        if host.main_camera() != Some(camera) || state.primary.is_none() {
            return None;
        }

        state.frame_counter += 1;
        state.capture_armed = self.dumping_enabled
            && state.sampling.is_active()
            && host.is_chord_pressed(&KeyChord::CAPTURE);

        let frame = state.frame_counter;
        let armed = state.capture_armed;
        let sampling = state.sampling;
        let (base_w, base_h) = sampling.base();
        let mut captures = Vec::new();

        let backend = host.backend();
        let primary = state.primary.as_ref()?;

        if armed {
            self.capture(backend, &primary.handle, frame, CaptureStage::Primary, &mut captures);
        }

        let (source, blit_width) = match state.secondary.as_ref() {
            Some(secondary) => {
                backend.set_active_target(Some(&secondary.handle));
                backend.load_pixel_matrix(PixelMatrix::screen(
                    base_w.saturating_mul(2),
                    base_h.saturating_mul(2),
                ));
                // Un-doubled width, doubled height. The reason is unknown but
                // the rest of the chain is tuned against exactly this rect.
                let stretch = PixelRect::new(0.0, 0.0, base_w as f32, base_h as f32 * 2.0);
                backend.draw_texture(stretch, &primary.handle);
                backend.set_active_target(None);

                if armed {
                    self.capture(
                        backend,
                        &secondary.handle,
                        frame,
                        CaptureStage::Secondary,
                        &mut captures,
                    );
                }
                (secondary, base_w / 2)
            }
            None => (primary, final_blit_width(&sampling)),
        };

        backend.set_active_target(None);
        backend.load_pixel_matrix(PixelMatrix::screen(base_w, base_h));
        backend.draw_texture(
            PixelRect::new(0.0, 0.0, blit_width as f32, base_h as f32),
            &source.handle,
        );

        Some(FrameComposite { frame, blit_width, captures })
    }

    fn capture<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        target: &B::Target,
        frame: u64,
        stage: CaptureStage,
        out: &mut Vec<PathBuf>,
    ) {
        let name = capture_file_name(frame, stage);
        match self.sink.dump(backend, target, &name) {
            Ok(path) => {
                log::info!("captured {}", path.display());
                out.push(path);
            }
            Err(e) => log::error!("capture {name} skipped: {e}"),
        }
    }
}
