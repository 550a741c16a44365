//! Supersampling render-target substitution for a host 3-D application.
//!
//! The host's main camera is redirected into an off-screen target rendered at
//! `sampling_factor` percent of the display resolution. After the camera
//! renders, the target is composited back onto the display, through a fixed
//! 2x intermediate stage when the factor exceeds 200.
//!
//! This crate owns no GPU or window code. Hosts implement [`Host`] and
//! [`RenderBackend`] and forward their scene-load and post-render
//! notifications to a [`PipelineController`].
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`allocator`] | `size_for`, `TargetAllocator` |
//! | [`backend`] | `RenderBackend`, `PixelMatrix`, `PixelRect`, `TargetDesc` |
//! | [`capture`] | `CaptureSink`, `PngCaptureSink`, capture file names |
//! | [`config`] | `OversampleConfig` (TOML), `SamplingConfig` |
//! | [`controller`] | `PipelineController` state machine |
//! | [`error`] | `AllocationError`, `CaptureError`, `ConfigError` |
//! | [`host`] | `Host`, camera/light ids, `KeyChord` |
//! | [`pipeline`] | `CompositePipeline`, `PipelineState`, `RenderTarget` |
//! | [`quality`] | `QualityOverrides` |

pub mod allocator;
pub mod backend;
pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod quality;

#[cfg(test)]
pub(crate) mod testing;

pub use allocator::{size_for, TargetAllocator};
pub use backend::{CapturedImage, PixelMatrix, PixelRect, RenderBackend, TargetDesc};
pub use capture::{capture_file_name, CaptureSink, CaptureStage, PngCaptureSink};
pub use config::{OversampleConfig, SamplingConfig};
pub use controller::{ControllerPhase, PipelineController, SceneLoad, SceneLoadMode};
pub use error::{AllocationError, CaptureError, ConfigError};
pub use host::{CameraId, CameraInfo, Host, Key, KeyChord, LightId, Modifier};
pub use pipeline::{CompositePipeline, FrameComposite, PipelineState, RenderTarget};
pub use quality::{AnisotropicFiltering, QualityOverrides, ShadowResolution};
