use std::fmt;
use std::sync::mpsc;

use oversample_core::{
    AllocationError, CaptureError, CapturedImage, PixelMatrix, PixelRect, RenderBackend,
    TargetAllocator, TargetDesc,
};

use super::blit::BlitRenderer;
use super::ctx::RenderCtx;
use super::target::GpuTarget;

/// Combined depth/stencil bits every target provides.
const DEPTH_STENCIL_BITS: u32 = 32;

/// Maps `rect` through `matrix` into NDC corners `(min, max)`.
///
/// `min` is the corner that samples texture (0, 0). Vertical extents map
/// directly. Horizontally the rect is stretched about the matrix's left edge
/// until its right edge meets the matrix's right edge: the composite rects
/// are tuned against a host whose texture draws always span the
/// destination's width, whatever the factor.
pub fn blit_rect_to_ndc(rect: PixelRect, matrix: PixelMatrix) -> ([f32; 2], [f32; 2]) {
    let reach = rect.max_x() - matrix.left;
    let x_scale = if reach == 0.0 { 1.0 } else { (matrix.right - matrix.left) / reach };

    let x0 = matrix.left + (rect.x - matrix.left) * x_scale;
    let x1 = matrix.left + reach * x_scale;
    (matrix.to_ndc(x0, rect.y), matrix.to_ndc(x1, rect.max_y()))
}

/// Settles a buffer map after a blocking poll without blocking again.
///
/// A failed poll (device lost, timeout) is reported before the map callback
/// is consulted, so a dead device never stalls the frame.
pub(crate) fn map_outcome<P, E, M>(
    poll: Result<P, E>,
    receiver: &mpsc::Receiver<Result<(), M>>,
) -> Result<(), CaptureError>
where
    E: fmt::Display,
    M: fmt::Debug,
{
    poll.map_err(|e| CaptureError::Readback(format!("device poll failed: {e}")))?;
    match receiver.try_recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CaptureError::Readback(format!("buffer map failed: {e:?}"))),
        Err(_) => Err(CaptureError::Readback("buffer map did not complete".into())),
    }
}

/// Bytes per row of a readback buffer, rounded up to wgpu's copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drops row padding, returning tightly packed 4-byte pixels.
pub(crate) fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_row as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    out
}

pub(crate) fn bgra_to_rgba_in_place(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ChannelOrder {
    Rgba,
    Bgra,
}

fn channel_order(format: wgpu::TextureFormat) -> Option<ChannelOrder> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {
            Some(ChannelOrder::Rgba)
        }
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
            Some(ChannelOrder::Bgra)
        }
        _ => None,
    }
}

/// wgpu implementation of [`RenderBackend`].
///
/// Work is recorded into one encoder per frame, opened by `begin_frame` and
/// submitted by `end_frame`. `None` as the active target means the display
/// view handed to `begin_frame`.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    max_dimension: u32,

    blit: BlitRenderer,
    next_id: u64,

    encoder: Option<wgpu::CommandEncoder>,
    display: Option<(wgpu::TextureView, (u32, u32))>,
    active: Option<GpuTarget>,
    matrix: PixelMatrix,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        log::debug!("render backend: format {format:?}, max target dimension {max_dimension}");

        Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            max_dimension,
            blit: BlitRenderer::new(),
            next_id: 1,
            encoder: None,
            display: None,
            active: None,
            matrix: PixelMatrix::screen(1, 1),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Opens a frame that ends on `display`.
    pub fn begin_frame(&mut self, display: wgpu::TextureView, size: (u32, u32)) {
        if self.encoder.is_some() {
            log::warn!("begin_frame called twice; submitting the previous frame");
            self.flush();
        }
        self.encoder = Some(self.new_encoder());
        self.display = Some((display, size));
        self.active = None;
        self.matrix = PixelMatrix::screen(size.0, size.1);
    }

    /// The frame encoder and display view, for scene rendering.
    pub fn frame_parts(&mut self) -> Option<(&mut wgpu::CommandEncoder, &wgpu::TextureView)> {
        let encoder = self.encoder.as_mut()?;
        let (view, _) = self.display.as_ref()?;
        Some((encoder, view))
    }

    /// Submits everything recorded so far and keeps the frame open.
    pub fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
            self.encoder = Some(self.new_encoder());
        }
    }

    /// Submits the frame. The display view can be presented afterwards.
    pub fn end_frame(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        self.display = None;
        self.active = None;
    }

    fn new_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("oversample frame encoder"),
            })
    }
}

impl RenderBackend for WgpuBackend {
    type Target = GpuTarget;

    fn max_target_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<GpuTarget, AllocationError> {
        TargetAllocator::validate(desc.width, desc.height, self.max_dimension)?;
        if desc.depth_bits > DEPTH_STENCIL_BITS {
            return Err(AllocationError::Device(format!(
                "{} depth bits requested, {DEPTH_STENCIL_BITS} available",
                desc.depth_bits
            )));
        }

        let id = self.next_id;
        self.next_id += 1;

        let target = GpuTarget::new(
            &self.device,
            id,
            desc.label,
            desc.width,
            desc.height,
            self.format,
        );
        log::debug!("created {} #{id} ({}x{})", desc.label, desc.width, desc.height);
        Ok(target)
    }

    fn release_target(&mut self, target: GpuTarget) {
        if self.active.as_ref().is_some_and(|a| a.id() == target.id()) {
            self.active = None;
        }
        // Work recorded against the target must reach the queue first.
        self.flush();
        log::debug!("released target #{}", target.id());
        target.destroy();
    }

    fn set_active_target(&mut self, target: Option<&GpuTarget>) {
        self.active = target.cloned();
    }

    fn load_pixel_matrix(&mut self, matrix: PixelMatrix) {
        self.matrix = matrix;
    }

    fn draw_texture(&mut self, dest: PixelRect, source: &GpuTarget) {
        if self.active.as_ref().is_some_and(|a| a.id() == source.id()) {
            log::warn!("skipping blit of target #{} onto itself", source.id());
            return;
        }

        let dest_view = match (&self.active, &self.display) {
            (Some(target), _) => target.color_view(),
            (None, Some((view, _))) => view,
            (None, None) => {
                log::warn!("draw_texture outside a frame; ignored");
                return;
            }
        };
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };

        let (min, max) = blit_rect_to_ndc(dest, self.matrix);

        let ctx = RenderCtx::new(&self.device, &self.queue, self.format);
        self.blit
            .draw(&ctx, encoder, dest_view, min, max, source.color_view());
    }

    fn read_pixels(&mut self, target: &GpuTarget) -> Result<CapturedImage, CaptureError> {
        let order = channel_order(self.format).ok_or_else(|| {
            CaptureError::Readback(format!("unsupported target format {:?}", self.format))
        })?;

        // Draws recorded earlier this frame must land before the copy.
        self.flush();

        let (width, height) = target.size();
        let padded_row = padded_bytes_per_row(width);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("oversample readback buffer"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.new_encoder();
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: target.color_texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let poll = self.device.poll(wgpu::PollType::wait_indefinitely());
        map_outcome(poll, &receiver)?;

        let mut rgba = {
            let data = slice.get_mapped_range();
            strip_row_padding(&data, width, height, padded_row)
        };
        buffer.unmap();

        if order == ChannelOrder::Bgra {
            bgra_to_rgba_in_place(&mut rgba);
        }

        Ok(CapturedImage { width, height, rgba })
    }
}

#[cfg(test)]
mod tests {
    use oversample_core::pipeline::final_blit_width;
    use oversample_core::SamplingConfig;

    use super::*;

    const FULL: ([f32; 2], [f32; 2]) = ([-1.0, 1.0], [1.0, -1.0]);

    fn assert_covers(got: ([f32; 2], [f32; 2]), what: &str) {
        for (g, w) in [got.0, got.1].iter().zip([FULL.0, FULL.1].iter()) {
            assert!((g[0] - w[0]).abs() < 1e-5 && (g[1] - w[1]).abs() < 1e-5, "{what}: {got:?}");
        }
    }

    #[test]
    fn full_rect_maps_through_screen_matrix() {
        let m = PixelMatrix::screen(200, 100);
        assert_eq!(blit_rect_to_ndc(PixelRect::new(0.0, 0.0, 200.0, 100.0), m), FULL);
    }

    #[test]
    fn both_stages_cover_their_destination_above_200() {
        for factor in [201, 250, 300, 400, 500] {
            let sampling = SamplingConfig::new((1920, 1080), factor);
            let (w, h) = sampling.base();
            let Some((sw, sh)) = sampling.secondary_size() else {
                panic!("factor {factor} needs a secondary target");
            };

            // Un-doubled width, doubled height, as the composite draws it.
            let stretch = PixelRect::new(0.0, 0.0, w as f32, h as f32 * 2.0);
            assert_covers(
                blit_rect_to_ndc(stretch, PixelMatrix::screen(sw, sh)),
                &format!("secondary stage, factor {factor}"),
            );

            let last = PixelRect::new(0.0, 0.0, final_blit_width(&sampling) as f32, h as f32);
            assert_covers(
                blit_rect_to_ndc(last, PixelMatrix::screen(w, h)),
                &format!("final stage, factor {factor}"),
            );
        }
    }

    #[test]
    fn single_stage_blit_covers_display() {
        for factor in [101, 150, 175, 200] {
            let sampling = SamplingConfig::new((1000, 500), factor);
            let rect = PixelRect::new(0.0, 0.0, final_blit_width(&sampling) as f32, 500.0);
            assert_covers(
                blit_rect_to_ndc(rect, PixelMatrix::screen(1000, 500)),
                &format!("factor {factor}"),
            );
        }
    }

    #[test]
    fn zero_width_rect_is_left_unscaled() {
        let m = PixelMatrix::screen(100, 100);
        let (min, max) = blit_rect_to_ndc(PixelRect::new(0.0, 0.0, 0.0, 100.0), m);
        assert_eq!(min[0], -1.0);
        assert_eq!(max[0], -1.0);
    }

    #[test]
    fn failed_poll_is_reported_without_waiting_for_the_map() {
        let (_sender, receiver) = mpsc::channel::<Result<(), String>>();
        let out = map_outcome(Err::<(), _>("device lost"), &receiver);
        assert!(matches!(out, Err(CaptureError::Readback(msg)) if msg.contains("device lost")));
    }

    #[test]
    fn missing_map_callback_is_an_error() {
        let (_sender, receiver) = mpsc::channel::<Result<(), String>>();
        let out = map_outcome(Ok::<(), String>(()), &receiver);
        assert!(matches!(out, Err(CaptureError::Readback(msg)) if msg.contains("did not complete")));
    }

    #[test]
    fn map_result_is_forwarded() {
        let (sender, receiver) = mpsc::channel::<Result<(), String>>();
        sender.send(Ok(())).unwrap();
        assert!(map_outcome(Ok::<(), String>(()), &receiver).is_ok());

        sender.send(Err("out of memory".to_string())).unwrap();
        let out = map_outcome(Ok::<(), String>(()), &receiver);
        assert!(matches!(out, Err(CaptureError::Readback(msg)) if msg.contains("out of memory")));
    }

    #[test]
    fn row_padding_is_aligned() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn strips_padding_per_row() {
        let padded = 256;
        let mut data = vec![0u8; padded * 2];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[padded..padded + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let out = strip_row_padding(&data, 2, 2, padded as u32);
        assert_eq!(out, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn swizzles_bgra() {
        let mut px = vec![10, 20, 30, 40, 1, 2, 3, 4];
        bgra_to_rgba_in_place(&mut px);
        assert_eq!(px, vec![30, 20, 10, 40, 3, 2, 1, 4]);
    }

    #[test]
    fn only_8bit_formats_are_readable() {
        assert_eq!(
            channel_order(wgpu::TextureFormat::Bgra8UnormSrgb),
            Some(ChannelOrder::Bgra)
        );
        assert_eq!(
            channel_order(wgpu::TextureFormat::Rgba8Unorm),
            Some(ChannelOrder::Rgba)
        );
        assert_eq!(channel_order(wgpu::TextureFormat::Rgba16Float), None);
    }
}
