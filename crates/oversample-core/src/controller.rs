//! Scene lifecycle orchestration.
//!
//! ```text
//! Idle --scene load--> SceneConfigured --targets bound--> PipelineArmed
//!                            ^                                 |
//!                            +---------- scene load -----------+
//! ```

use crate::backend::RenderBackend;
use crate::capture::CaptureSink;
use crate::config::{OversampleConfig, SamplingConfig};
use crate::host::{CameraId, Host};
use crate::pipeline::{CompositePipeline, FrameComposite, PipelineState};
use crate::quality::QualityOverrides;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneLoadMode {
    Single,
    Additive,
}

/// Scene-load notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLoad {
    pub name: String,
    pub mode: SceneLoadMode,
}

impl SceneLoad {
    pub fn single(name: impl Into<String>) -> Self {
        Self { name: name.into(), mode: SceneLoadMode::Single }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ControllerPhase {
    /// No scene loaded yet.
    Idle,
    /// Quality overrides applied; no supersampling for this scene.
    SceneConfigured,
    /// Targets requested and the post-render hook live.
    PipelineArmed,
}

/// Receives the host's scene-load and post-render notifications.
///
/// Owns the single live [`PipelineState`]. Nothing returned from the
/// notification handlers is an error: failures are logged and the frame
/// degrades to plain rendering.
#[derive(Debug)]
pub struct PipelineController<T, S> {
    config: OversampleConfig,
    pipeline: CompositePipeline<S>,
    state: Option<PipelineState<T>>,
    phase: ControllerPhase,
    post_render_hooked: bool,
}

impl<T, S: CaptureSink> PipelineController<T, S> {
    pub fn new(config: OversampleConfig, sink: S) -> Self {
        Self {
            config,
            pipeline: CompositePipeline::new(sink),
            state: None,
            phase: ControllerPhase::Idle,
            post_render_hooked: false,
        }
    }

    pub fn config(&self) -> &OversampleConfig {
        &self.config
    }

    /// Replaces the configuration. Read at the next scene load.
    pub fn set_config(&mut self, config: OversampleConfig) {
        self.config = config;
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&PipelineState<T>> {
        self.state.as_ref()
    }

    pub fn pipeline(&self) -> &CompositePipeline<S> {
        &self.pipeline
    }

    pub fn is_post_render_hooked(&self) -> bool {
        self.post_render_hooked
    }

    /// Scene-load notification.
    pub fn on_scene_loaded<H>(&mut self, host: &mut H, scene: &SceneLoad)
    where
        H: Host,
        H::Backend: RenderBackend<Target = T>,
    {
        log::info!("Scene loaded: {} ({:?})", scene.name, scene.mode);

        // An additive load keeps the loaded scenes, and with them the camera
        // still rendering into the previous primary target.
        let carried = match self.state.take() {
            Some(previous)
                if scene.mode == SceneLoadMode::Additive && previous.primary().is_some() =>
            {
                log::info!("-> Additive load; keeping the current render targets");
                Some(previous)
            }
            Some(previous) => {
                previous.release(host.backend());
                None
            }
            None => None,
        };
        self.phase = ControllerPhase::SceneConfigured;

        let general = self.config.general.clone();

        if general.override_quality_settings {
            log::info!("-> Overriding basic quality settings");
            host.apply_quality(&QualityOverrides::maximum());
        }

        if general.shadow_resolution > 0 {
            log::info!("-> Overriding light shadow resolutions");
            for light in host.lights() {
                log::info!(
                    "    * Setting shadow resolution to {} for {light}",
                    general.shadow_resolution
                );
                host.set_light_shadow_resolution(light, general.shadow_resolution);
            }
        }

        let mut state = carried.unwrap_or_else(|| {
            PipelineState::new(SamplingConfig::from_config(&self.config, host.screen_size()))
        });
        let sampling = *state.sampling();
        self.pipeline.set_dumping_enabled(general.enable_render_target_dumping);

        if sampling.is_active() {
            log::info!("-> Overriding main camera sampling factor");
            match self.pipeline.bind(host, &mut state) {
                Ok(Some(camera)) => log::debug!("{camera} redirected to primary target"),
                Ok(None) => log::info!("    -> No camera redirected for this scene"),
                Err(e) => log::error!("    -> {e}; rendering without supersampling"),
            }

            if !self.post_render_hooked {
                log::debug!("post-render hook registered");
                self.post_render_hooked = true;
            }
            if state.primary().is_some() {
                self.phase = ControllerPhase::PipelineArmed;
            }
        }

        self.state = Some(state);
    }

    /// Post-render notification, once per camera per frame.
    pub fn on_post_render<H>(&mut self, host: &mut H, camera: CameraId) -> Option<FrameComposite>
    where
        H: Host,
        H::Backend: RenderBackend<Target = T>,
    {
        if !self.post_render_hooked {
            return None;
        }
        let state = self.state.as_mut()?;
        self.pipeline.composite(host, state, camera)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::capture::PngCaptureSink;
    use crate::host::LightId;
    use crate::testing::{BackendCall, MockHost, MockTarget, RecordingSink, MAIN, OVERLAY};

    type Controller = PipelineController<MockTarget, RecordingSink>;

    fn config(factor: u32, dumping: bool) -> OversampleConfig {
        let mut cfg = OversampleConfig::default();
        cfg.general.sampling_factor = factor;
        cfg.general.enable_render_target_dumping = dumping;
        cfg
    }

    fn loaded(host: &mut MockHost, cfg: OversampleConfig) -> Controller {
        let mut c = Controller::new(cfg, RecordingSink::default());
        c.on_scene_loaded(host, &SceneLoad::single("Level01"));
        c
    }

    fn frame(c: &mut Controller, host: &mut MockHost) -> Option<FrameComposite> {
        let overlay = c.on_post_render(host, OVERLAY);
        assert_eq!(overlay, None);
        c.on_post_render(host, MAIN)
    }

    // ── scenarios ─────────────────────────────────────────────────────────

    #[test]
    fn scenario_a_factor_100_is_inert() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(100, true));
        host.chord_held = true;

        for _ in 0..3 {
            assert_eq!(frame(&mut c, &mut host), None);
        }
        assert!(host.backend.calls().is_empty());
        assert!(host.camera_targets.is_empty());
        assert!(c.pipeline().sink().names.is_empty());
        assert_eq!(c.phase(), ControllerPhase::SceneConfigured);
        assert!(!c.is_post_render_hooked());
    }

    #[test]
    fn scenario_b_factor_200_single_target() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(200, false));

        assert_eq!(host.backend.created_sizes(), vec![(3840, 2160)]);
        let out = frame(&mut c, &mut host).unwrap();
        assert_eq!(out.blit_width, 960);
        assert!(c.state().unwrap().secondary().is_none());
        assert_eq!(c.phase(), ControllerPhase::PipelineArmed);
    }

    #[test]
    fn scenario_c_factor_400_two_targets() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(400, false));

        assert_eq!(host.backend.created_sizes(), vec![(7680, 4320), (3840, 2160)]);
        let out = frame(&mut c, &mut host).unwrap();
        assert_eq!(out.blit_width, 960);
    }

    #[test]
    fn scenario_d_capture_on_seventh_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new((64, 32));
        let mut c = PipelineController::new(config(200, true), PngCaptureSink::new(dir.path()));
        c.on_scene_loaded(&mut host, &SceneLoad::single("Level01"));

        for _ in 0..6 {
            c.on_post_render(&mut host, MAIN).unwrap();
        }
        host.chord_held = true;
        let out = c.on_post_render(&mut host, MAIN).unwrap();

        assert_eq!(out.frame, 7);
        assert_eq!(out.captures, vec![dir.path().join("00000007-mod-replacement-rt.png")]);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["00000007-mod-replacement-rt.png".to_string()]);
    }

    // ── properties ────────────────────────────────────────────────────────

    #[test]
    fn factors_up_to_200_allocate_exactly_one_target() {
        for factor in [101, 125, 150, 175, 199, 200] {
            let mut host = MockHost::new((1280, 720));
            let mut c = loaded(&mut host, config(factor, false));

            let expected = (1280 * factor / 100, 720 * factor / 100);
            assert_eq!(host.backend.created_sizes(), vec![expected], "factor {factor}");
            let out = frame(&mut c, &mut host).unwrap();
            assert_eq!(out.blit_width, 1280 * 100 / factor, "factor {factor}");
        }
    }

    #[test]
    fn factors_above_200_use_fixed_secondary() {
        for factor in [201, 250, 300, 400, 500] {
            let mut host = MockHost::new((1280, 720));
            let mut c = loaded(&mut host, config(factor, false));

            let sizes = host.backend.created_sizes();
            assert_eq!(sizes.len(), 2, "factor {factor}");
            assert_eq!(sizes[1], (2560, 1440), "factor {factor}");
            assert_eq!(frame(&mut c, &mut host).unwrap().blit_width, 640, "factor {factor}");
        }
    }

    #[test]
    fn capture_requires_dumping_hotkey_and_active_factor() {
        for (factor, dumping, held, expected) in [
            (100, true, true, 0),
            (200, false, true, 0),
            (200, true, false, 0),
            (200, true, true, 1),
            (400, true, true, 2),
        ] {
            let mut host = MockHost::new((320, 240));
            let mut c = loaded(&mut host, config(factor, dumping));
            host.chord_held = held;

            frame(&mut c, &mut host);

            let names = &c.pipeline().sink().names;
            assert_eq!(names.len(), expected, "factor {factor} dumping {dumping} held {held}");
        }
    }

    #[test]
    fn two_stage_capture_names_both_targets() {
        let mut host = MockHost::new((320, 240));
        let mut c = loaded(&mut host, config(400, true));
        host.chord_held = true;

        frame(&mut c, &mut host);

        assert_eq!(
            c.pipeline().sink().names,
            vec!["00000001-mod-replacement-rt", "00000001-mod-secondary-replacement-rt"]
        );
    }

    #[test]
    fn zero_base_resolution_fails_once_and_renders_directly() {
        let mut host = MockHost::new((0, 1080));
        let mut c = loaded(&mut host, config(200, true));
        host.chord_held = true;

        assert!(c.state().unwrap().bind_failed());
        assert!(host.camera_targets.is_empty());
        assert_eq!(c.phase(), ControllerPhase::SceneConfigured);
        assert!(c.is_post_render_hooked());
        for _ in 0..3 {
            assert_eq!(frame(&mut c, &mut host), None);
        }
        assert!(host.backend.calls().is_empty());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn starts_idle() {
        let c = Controller::new(OversampleConfig::default(), RecordingSink::default());
        assert_eq!(c.phase(), ControllerPhase::Idle);
        assert!(c.state().is_none());
    }

    #[test]
    fn post_render_before_any_scene_is_noop() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = Controller::new(config(200, false), RecordingSink::default());
        assert_eq!(c.on_post_render(&mut host, MAIN), None);
    }

    #[test]
    fn quality_overrides_follow_config() {
        let mut host = MockHost::new((1920, 1080));
        let _ = loaded(&mut host, config(100, false));
        assert_eq!(host.quality_applied, vec![QualityOverrides::maximum()]);

        let mut host = MockHost::new((1920, 1080));
        let mut cfg = config(100, false);
        cfg.general.override_quality_settings = false;
        let _ = loaded(&mut host, cfg);
        assert!(host.quality_applied.is_empty());
    }

    #[test]
    fn shadow_resolution_applies_to_every_light() {
        let mut host = MockHost::new((1920, 1080));
        let _ = loaded(&mut host, config(100, false));
        assert!(host.shadow_resolutions.is_empty());

        let mut cfg = config(100, false);
        cfg.general.shadow_resolution = 4096;
        let _ = loaded(&mut host, cfg);
        assert_eq!(host.shadow_resolutions[&LightId(10)], 4096);
        assert_eq!(host.shadow_resolutions[&LightId(11)], 4096);
    }

    #[test]
    fn scene_reload_releases_previous_targets_and_restarts_counter() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(400, false));
        frame(&mut c, &mut host);
        frame(&mut c, &mut host);
        assert_eq!(c.state().unwrap().frame_counter(), 2);

        // The new scene brings a fresh main camera.
        host.camera_targets.clear();
        host.backend.clear_calls();
        c.on_scene_loaded(&mut host, &SceneLoad::single("Level02"));

        let calls = host.backend.calls();
        assert_eq!(calls[0], BackendCall::Release { id: 1 });
        assert_eq!(calls[1], BackendCall::Release { id: 2 });
        assert!(matches!(calls[2], BackendCall::Create { width: 7680, .. }));
        assert_eq!(c.state().unwrap().frame_counter(), 0);
    }

    #[test]
    fn additive_load_keeps_bound_targets_compositing() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(400, false));
        frame(&mut c, &mut host);
        host.backend.clear_calls();

        // The main camera survives and still renders into target 1.
        c.on_scene_loaded(&mut host, &SceneLoad { name: "Overlay".into(), mode: SceneLoadMode::Additive });

        assert!(!host
            .backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::Release { .. } | BackendCall::Create { .. })));
        assert_eq!(host.camera_targets.get(&MAIN), Some(&1));
        assert_eq!(c.phase(), ControllerPhase::PipelineArmed);

        let out = frame(&mut c, &mut host).unwrap();
        assert_eq!(out.frame, 2);
        assert_eq!(out.blit_width, 960);
    }

    #[test]
    fn additive_load_without_targets_starts_fresh() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(100, false));

        c.set_config(config(200, false));
        c.on_scene_loaded(&mut host, &SceneLoad { name: "Overlay".into(), mode: SceneLoadMode::Additive });

        assert_eq!(host.backend.created_sizes(), vec![(3840, 2160)]);
        assert_eq!(c.phase(), ControllerPhase::PipelineArmed);
    }

    #[test]
    fn hook_persists_after_reload_into_inert_scene() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(200, false));
        assert!(c.is_post_render_hooked());

        c.set_config(config(100, false));
        host.camera_targets.clear();
        c.on_scene_loaded(&mut host, &SceneLoad::single("Menu"));
        host.backend.clear_calls();

        assert!(c.is_post_render_hooked());
        assert_eq!(c.phase(), ControllerPhase::SceneConfigured);
        assert_eq!(frame(&mut c, &mut host), None);
        assert!(host.backend.calls().is_empty());
    }

    #[test]
    fn config_changes_apply_on_next_scene_load() {
        let mut host = MockHost::new((1920, 1080));
        let mut c = loaded(&mut host, config(100, false));
        c.set_config(config(150, false));
        assert!(host.backend.calls().is_empty());

        c.on_scene_loaded(&mut host, &SceneLoad::single("Level01"));
        assert_eq!(host.backend.created_sizes(), vec![(2880, 1620)]);
    }
}
