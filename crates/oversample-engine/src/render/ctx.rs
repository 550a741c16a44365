/// Renderer-facing context (device/queue + color format).
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Format of every color destination: the surface and all targets.
    pub color_format: wgpu::TextureFormat,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            color_format,
        }
    }
}
