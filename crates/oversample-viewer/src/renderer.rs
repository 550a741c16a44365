use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::scene::{CameraRole, Scene};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct SceneUniform {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub tint: [f32; 4],
    pub light_a: [f32; 4],
    pub light_b: [f32; 4],
    pub time: f32,
    pub spokes: f32,
    pub detail: f32,
    pub _pad: f32,
}

impl SceneUniform {
    pub(crate) fn new(scene: &Scene, role: CameraRole, viewport: (u32, u32, u32, u32), time: f32) -> Self {
        let (x, y, w, h) = viewport;
        let tint = match role {
            CameraRole::Main => [1.0, 0.95, 0.85, 1.0],
            CameraRole::Inset => [0.55, 0.8, 1.0, 1.0],
        };
        let light = |i: usize| {
            scene.lights.get(i).map_or([0.0; 4], |l| {
                // Larger shadow maps give tighter falloff.
                let softness = (l.shadow_resolution as f32 / 1024.0).log2().max(0.0);
                [l.position[0], l.position[1], l.intensity, softness]
            })
        };

        Self {
            origin: [x as f32, y as f32],
            size: [w.max(1) as f32, h.max(1) as f32],
            tint,
            light_a: light(0),
            light_b: light(1),
            time,
            spokes: 96.0,
            detail: scene.detail(),
            _pad: 0.0,
        }
    }
}

/// Where one camera draws.
pub struct CameraPass<'a> {
    pub color: &'a wgpu::TextureView,
    /// Present when the camera renders into an off-screen target.
    pub depth: Option<&'a wgpu::TextureView>,
    pub viewport: (u32, u32, u32, u32),
    /// Whether the pass owns the whole destination and clears it first.
    pub clear: bool,
}

/// Draws the procedural spoke pattern.
#[derive(Default)]
pub struct SceneRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        encoder: &mut wgpu::CommandEncoder,
        pass: CameraPass<'_>,
        uniform: SceneUniform,
    ) {
        self.ensure_pipeline(device, format);
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        if pass.clear {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("spokes clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: pass.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: pass.depth.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(0),
                            store: wgpu::StoreOp::Store,
                        }),
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spokes ubo"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spokes bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("spokes pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: pass.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let (x, y, w, h) = pass.viewport;
        rpass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
        rpass.set_scissor_rect(x, y, w, h);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spokes shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/spokes.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("spokes bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<SceneUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spokes pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("spokes pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("spokes pipeline built for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
    }
}
