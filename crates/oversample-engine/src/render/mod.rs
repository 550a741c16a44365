//! GPU rendering subsystem.
//!
//! `WgpuBackend` implements the core crate's `RenderBackend` on top of wgpu:
//! off-screen targets, pixel-matrix texture blits and target readback.
//!
//! Convention:
//! - Pixel rects are top-left origin, +Y down.
//! - The vertex shader receives destination corners already in NDC.

mod backend;
mod blit;
mod common;
mod ctx;
mod target;

pub use backend::{blit_rect_to_ndc, WgpuBackend};
pub use blit::BlitRenderer;
pub use ctx::RenderCtx;
pub use target::{GpuTarget, DEPTH_FORMAT};
