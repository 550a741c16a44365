use crate::error::{AllocationError, CaptureError};

/// Axis-aligned rectangle in pixel space (top-left origin, +Y down).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn max_x(self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn max_y(self) -> f32 {
        self.y + self.height
    }
}

/// Pixel-space orthographic projection.
///
/// `bottom` and `top` name the pixel rows at the bottom and top edges of the
/// destination. `PixelMatrix::new(0, w, h, 0)` is the usual screen mapping
/// with the origin in the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelMatrix {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl PixelMatrix {
    #[inline]
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self { left, right, bottom, top }
    }

    /// Covers `[0, width] x [0, height]` with the origin at the top-left.
    #[inline]
    pub fn screen(width: u32, height: u32) -> Self {
        Self::new(0.0, width as f32, height as f32, 0.0)
    }

    /// Maps a pixel coordinate to normalized device coordinates.
    ///
    /// Degenerate spans map to the center of that axis.
    pub fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        let span_x = self.right - self.left;
        let span_y = self.top - self.bottom;
        let nx = if span_x == 0.0 { 0.0 } else { (x - self.left) / span_x * 2.0 - 1.0 };
        let ny = if span_y == 0.0 { 0.0 } else { (y - self.bottom) / span_y * 2.0 - 1.0 };
        [nx, ny]
    }
}

/// Parameters for a new render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Combined depth/stencil bits the target must provide.
    pub depth_bits: u32,
}

/// CPU copy of a render target, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Graphics operations the pipeline needs from the host renderer.
///
/// The model is immediate: an active destination plus a current pixel matrix,
/// against which `draw_texture` stretches a source target. `None` as the
/// active target means the display surface.
pub trait RenderBackend {
    /// Opaque GPU resource handle.
    type Target;

    /// Largest width or height `create_target` accepts.
    fn max_target_dimension(&self) -> u32;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<Self::Target, AllocationError>;

    /// Releases a target at scene teardown.
    fn release_target(&mut self, target: Self::Target);

    fn set_active_target(&mut self, target: Option<&Self::Target>);

    fn load_pixel_matrix(&mut self, matrix: PixelMatrix);

    /// Draws `source` stretched into `dest`, interpreted through the current
    /// pixel matrix, onto the active target.
    fn draw_texture(&mut self, dest: PixelRect, source: &Self::Target);

    /// Reads the current contents of `target` back to the CPU.
    fn read_pixels(&mut self, target: &Self::Target) -> Result<CapturedImage, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_matrix_maps_corners() {
        let m = PixelMatrix::screen(1920, 1080);
        assert_eq!(m.to_ndc(0.0, 0.0), [-1.0, 1.0]);
        assert_eq!(m.to_ndc(1920.0, 1080.0), [1.0, -1.0]);
        assert_eq!(m.to_ndc(960.0, 540.0), [0.0, 0.0]);
    }

    #[test]
    fn flipped_matrix_maps_origin_to_bottom() {
        let m = PixelMatrix::new(0.0, 100.0, 0.0, 100.0);
        assert_eq!(m.to_ndc(0.0, 0.0), [-1.0, -1.0]);
    }

    #[test]
    fn degenerate_matrix_collapses_to_center() {
        let m = PixelMatrix::new(5.0, 5.0, 0.0, 0.0);
        assert_eq!(m.to_ndc(123.0, 7.0), [0.0, 0.0]);
    }

    #[test]
    fn rect_extents() {
        let r = PixelRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.max_x(), 40.0);
        assert_eq!(r.max_y(), 60.0);
    }
}
