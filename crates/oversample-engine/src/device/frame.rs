/// A single acquired swapchain image.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Command recording happens on the render backend's encoder; this
/// only carries the image that gets presented.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
}

impl GpuFrame {
    /// Creates a fresh view of the swapchain image.
    pub fn create_view(&self) -> wgpu::TextureView {
        self.surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn size(&self) -> (u32, u32) {
        let t = &self.surface_texture.texture;
        (t.width(), t.height())
    }
}
