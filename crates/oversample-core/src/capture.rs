//! Writing render targets to image files.

use std::fs;
use std::path::PathBuf;

use image::{ImageFormat, RgbaImage};

use crate::backend::RenderBackend;
use crate::error::CaptureError;

/// Which composite target a capture comes from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CaptureStage {
    Primary,
    Secondary,
}

impl CaptureStage {
    fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "mod-replacement-rt",
            Self::Secondary => "mod-secondary-replacement-rt",
        }
    }
}

/// `{frame:08}-mod-replacement-rt` or `{frame:08}-mod-secondary-replacement-rt`.
pub fn capture_file_name(frame: u64, stage: CaptureStage) -> String {
    format!("{frame:08}-{}", stage.suffix())
}

/// Destination for render-target dumps.
pub trait CaptureSink {
    /// Writes `target` under `name` (no extension) and returns the file path.
    fn dump<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        target: &B::Target,
        name: &str,
    ) -> Result<PathBuf, CaptureError>;
}

/// Writes PNG files into a directory.
#[derive(Debug, Clone)]
pub struct PngCaptureSink {
    directory: PathBuf,
}

impl PngCaptureSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }
}

impl CaptureSink for PngCaptureSink {
    fn dump<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        target: &B::Target,
        name: &str,
    ) -> Result<PathBuf, CaptureError> {
        let captured = backend.read_pixels(target)?;
        let (width, height) = (captured.width, captured.height);
        let image = RgbaImage::from_raw(width, height, captured.rgba).ok_or_else(|| {
            CaptureError::Readback(format!("pixel buffer does not match {width}x{height}"))
        })?;

        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!("{name}.png"));
        image.save_with_format(&path, ImageFormat::Png)?;
        Ok(path)
    }
}
