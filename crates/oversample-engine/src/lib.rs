//! Oversample engine crate.
//!
//! Owns the platform + GPU runtime: window loop, device/surface management,
//! input, frame timing, and the wgpu implementation of the core crate's
//! `RenderBackend`.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
