use std::path::PathBuf;

use winit::event::WindowEvent;

use oversample_core::{
    CameraId, Host, KeyChord, OversampleConfig, PipelineController, PngCaptureSink, SceneLoad,
};
use oversample_engine::core::{App, AppControl, FrameCtx};
use oversample_engine::device::Gpu;
use oversample_engine::input::Key;
use oversample_engine::render::{GpuTarget, WgpuBackend};

use crate::host::ViewerHost;
use crate::renderer::{CameraPass, SceneRenderer, SceneUniform};
use crate::scene::{viewport, CameraRole, Scene};

/// Captures land here, relative to the working directory.
pub const CAPTURE_DIR: &str = "captures";

pub struct ViewerApp {
    config_path: PathBuf,
    controller: PipelineController<GpuTarget, PngCaptureSink>,
    renderer: SceneRenderer,

    /// Created on the first frame, once the GPU exists.
    host: Option<ViewerHost>,
    generation: u64,
    load_pending: bool,
}

impl ViewerApp {
    pub fn new(config_path: PathBuf, config: OversampleConfig) -> Self {
        Self {
            config_path,
            controller: PipelineController::new(config, PngCaptureSink::new(CAPTURE_DIR)),
            renderer: SceneRenderer::new(),
            host: None,
            generation: 0,
            load_pending: true,
        }
    }

    /// Re-reads the config file and queues a scene load that applies it.
    fn reload(&mut self) {
        match OversampleConfig::load_or_create(&self.config_path) {
            Ok(config) => {
                config.log_summary();
                self.controller.set_config(config);
            }
            Err(e) => log::error!(
                "{}: {e}; keeping previous settings",
                self.config_path.display()
            ),
        }
        self.load_pending = true;
    }

    fn draw_frame(
        &mut self,
        gpu: &Gpu<'_>,
        view: wgpu::TextureView,
        size: (u32, u32),
        capture_chord_down: bool,
        time: f32,
    ) {
        let host = self.host.get_or_insert_with(|| {
            let backend = WgpuBackend::new(gpu.device(), gpu.queue(), gpu.surface_format());
            ViewerHost::new(backend, Scene::spokes(0), size)
        });
        host.set_screen_size(size);
        host.set_capture_chord_down(capture_chord_down);
        host.backend.begin_frame(view, size);

        if std::mem::take(&mut self.load_pending) {
            self.generation += 1;
            host.replace_scene(Scene::spokes(self.generation));
            let load = SceneLoad::single(host.scene.name());
            self.controller.on_scene_loaded(host, &load);
        }

        for camera in host.cameras() {
            render_camera(&mut self.renderer, host, camera, size, time);
            if let Some(done) = self.controller.on_post_render(host, camera) {
                log::trace!("composite #{} ({} px wide)", done.frame, done.blit_width);
            }
        }

        host.backend.end_frame();
    }
}

/// Records `camera`'s view of the scene into its destination.
fn render_camera(
    renderer: &mut SceneRenderer,
    host: &mut ViewerHost,
    camera: CameraId,
    display_size: (u32, u32),
    time: f32,
) {
    let ViewerHost { backend, scene, .. } = host;
    let Some(cam) = scene.camera(camera) else {
        return;
    };

    let format = backend.format();
    let device = backend.device().clone();
    let Some((encoder, display)) = backend.frame_parts() else {
        return;
    };

    let pass = match &cam.target {
        Some(target) => {
            let (w, h) = target.size();
            CameraPass {
                color: target.color_view(),
                depth: Some(target.depth_view()),
                viewport: (0, 0, w, h),
                clear: true,
            }
        }
        None => CameraPass {
            color: display,
            depth: None,
            viewport: viewport(cam.role, display_size),
            clear: cam.role == CameraRole::Main,
        },
    };

    let uniform = SceneUniform::new(scene, cam.role, pass.viewport, time);
    renderer.draw(&device, format, encoder, pass, uniform);
}

impl App for ViewerApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::Resized(size) = event {
            log::info!(
                "window resized to {}x{}; press F5 to resample at the new size",
                size.width,
                size.height
            );
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }
        if ctx.input_frame.pressed(Key::F5) {
            log::info!("reloading {}", self.config_path.display());
            self.reload();
        }

        let chord = ctx.input.chord_down(&KeyChord::CAPTURE);
        let time = ctx.time.elapsed;

        ctx.render(|gpu, view, size| self.draw_frame(gpu, view, size, chord, time))
    }
}
