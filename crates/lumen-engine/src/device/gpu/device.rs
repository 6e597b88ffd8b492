use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::device::{
    check_texture_data, Device, DeviceError, DeviceKind, DrawState, MagFilter, MinFilter, Quad,
    ResourceCache, ResourceStats, TextureInfo,
};
use crate::paint::Color;

use super::GpuInit;

const SOLID_SHADER: &str = "solid";

/// Encoder and view of the frame currently being drawn.
pub(crate) struct FrameTarget {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    pub format: wgpu::TextureFormat,
    pub size: (u32, u32),
}

struct GpuTexture {
    info: TextureInfo,
    // Kept alive for the lifetime of the cache entry.
    _texture: wgpu::Texture,
    _view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
}

struct QuadBuffers {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
}

/// Device shared by every window of a `WgpuBackend`.
///
/// Shaders and pipelines are built lazily on first draw and cached by name;
/// pipelines are keyed by target format, so windows with different swapchain
/// formats each get their own.
pub struct WgpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    target: Option<FrameTarget>,
    quad: Option<QuadBuffers>,

    textures: ResourceCache<GpuTexture>,
    shaders: ResourceCache<wgpu::ShaderModule>,
    programs: ResourceCache<wgpu::RenderPipeline>,

    min_filter: MinFilter,
    mag_filter: MagFilter,
    frame: u64,
}

impl WgpuDevice {
    /// Requests a device on an adapter able to present to `surface`.
    pub(crate) async fn new(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'_>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("gpu: using {} ({:?})", info.name, info.backend);

        Ok(Self {
            adapter,
            device,
            queue,
            target: None,
            quad: None,
            textures: ResourceCache::new(),
            shaders: ResourceCache::new(),
            programs: ResourceCache::new(),
            min_filter: MinFilter::default(),
            mag_filter: MagFilter::default(),
            frame: 0,
        })
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub(crate) fn bind_target(&mut self, target: FrameTarget) {
        if self.target.replace(target).is_some() {
            log::warn!("gpu: previous frame target dropped without submit");
        }
    }

    pub(crate) fn take_target(&mut self) -> Option<FrameTarget> {
        self.target.take()
    }

    fn ensure_quad_buffers(&mut self) {
        if self.quad.is_some() {
            return;
        }
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.quad = Some(QuadBuffers { vbo, ibo });
    }

    /// Builds (or touches) the solid-fill pipeline for `format`.
    fn ensure_solid_program(&mut self, format: wgpu::TextureFormat) -> String {
        let frame = self.frame;
        let program = format!("solid/{format:?}");

        if self.shaders.touch(SOLID_SHADER, frame).is_none() {
            log::debug!("gpu: compiling shader '{SOLID_SHADER}'");
            let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("lumen solid shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/solid.wgsl").into()),
            });
            self.shaders.insert(SOLID_SHADER, module, frame);
        }
        if self.programs.touch(&program, frame).is_some() {
            return program;
        }

        log::debug!("gpu: building program '{program}'");
        let Some(shader) = self.shaders.get(SOLID_SHADER) else {
            return program;
        };
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("lumen solid pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("lumen solid pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[QuadCorner::layout(), SolidInstance::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
        self.programs.insert(&program, pipeline, frame);
        program
    }

    fn make_sampler(&self) -> wgpu::Sampler {
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen texture sampler"),
            mag_filter: match self.mag_filter {
                MagFilter::Nearest => wgpu::FilterMode::Nearest,
                MagFilter::Linear => wgpu::FilterMode::Linear,
            },
            min_filter: match self.min_filter {
                MinFilter::Nearest | MinFilter::Mipmap => wgpu::FilterMode::Nearest,
                MinFilter::Linear | MinFilter::Bilinear | MinFilter::Trilinear => {
                    wgpu::FilterMode::Linear
                }
            },
            ..Default::default()
        })
    }
}

impl Device for WgpuDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Wgpu
    }

    fn begin_frame(&mut self) {
        self.frame += 1;
    }

    fn end_frame(&mut self, _display: bool) {}

    fn frame_number(&self) -> u64 {
        self.frame
    }

    fn clear_color(&mut self, color: Color) {
        let Some(target) = self.target.as_mut() else { return };
        let c = target_color(color, target.format);
        // A pass with a clear load op and no draws is the clear.
        let _ = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: c[0] as f64,
                        g: c[1] as f64,
                        b: c[2] as f64,
                        a: c[3] as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn set_default_min_filter(&mut self, filter: MinFilter) {
        self.min_filter = filter;
    }

    fn set_default_mag_filter(&mut self, filter: MagFilter) {
        self.mag_filter = filter;
    }

    fn make_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), DeviceError> {
        check_texture_data(name, width, height, rgba)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let entry = GpuTexture {
            info: TextureInfo {
                width,
                height,
                min_filter: self.min_filter,
                mag_filter: self.mag_filter,
            },
            _sampler: self.make_sampler(),
            _view: view,
            _texture: texture,
        };
        self.textures.insert(name, entry, self.frame);
        Ok(())
    }

    fn find_texture(&mut self, name: &str) -> Option<TextureInfo> {
        self.textures.touch(name, self.frame).map(|t| t.info)
    }

    fn delete_texture(&mut self, name: &str) -> bool {
        self.textures.remove(name).is_some()
    }

    fn delete_textures(&mut self) {
        self.textures.clear();
    }

    fn delete_programs(&mut self) {
        self.programs.clear();
    }

    fn delete_shaders(&mut self) {
        self.shaders.clear();
    }

    fn draw_quads(&mut self, state: &DrawState, quads: &[Quad]) {
        let Some(format) = self.target.as_ref().map(|t| t.format) else { return };
        let Some((sw, sh)) = self.target.as_ref().map(|t| t.size) else { return };
        let Some(viewport) = state.viewport.clamp_to(sw, sh) else { return };

        let instances: Vec<SolidInstance> = quads
            .iter()
            .filter_map(|q| {
                let r = state.to_pixels(q.rect.normalized());
                if r.is_empty() {
                    return None;
                }
                Some(SolidInstance {
                    origin: [r.origin.x / sw as f32 * 2.0 - 1.0, 1.0 - r.origin.y / sh as f32 * 2.0],
                    size: [r.size.x / sw as f32 * 2.0, -r.size.y / sh as f32 * 2.0],
                    color: target_color(q.color.premultiplied(), format),
                })
            })
            .collect();
        if instances.is_empty() {
            return;
        }

        self.ensure_quad_buffers();
        let program = self.ensure_solid_program(format);

        // Each draw gets its own instance buffer: queued buffer writes would
        // all land before the frame's single submit.
        let instance_vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen solid instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let (Some(target), Some(pipeline), Some(quad)) =
            (self.target.as_mut(), self.programs.get(&program), self.quad.as_ref())
        else {
            return;
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen solid pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
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

        rpass.set_pipeline(pipeline);
        rpass.set_scissor_rect(
            viewport.x as u32,
            viewport.y as u32,
            viewport.width,
            viewport.height,
        );
        rpass.set_vertex_buffer(0, quad.vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    fn clean_garbage(&mut self, max_idle_frames: u64) -> usize {
        let frame = self.frame;
        self.textures.collect_idle(frame, max_idle_frames)
            + self.programs.collect_idle(frame, max_idle_frames)
            + self.shaders.collect_idle(frame, max_idle_frames)
    }

    fn resource_stats(&self) -> ResourceStats {
        ResourceStats {
            textures: self.textures.len(),
            texture_bytes: self.textures.values().map(|t| t.info.bytes()).sum(),
            shaders: self.shaders.len(),
            programs: self.programs.len(),
        }
    }
}

/// Converts a color to the encoding expected by `format`.
fn target_color(color: Color, format: wgpu::TextureFormat) -> [f32; 4] {
    if format.is_srgb() {
        [
            srgb_to_linear(color.r),
            srgb_to_linear(color.g),
            srgb_to_linear(color.b),
            color.a,
        ]
    } else {
        [color.r, color.g, color.b, color.a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadCorner {
    pos: [f32; 2],
}

impl QuadCorner {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadCorner>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_CORNERS: [QuadCorner; 4] = [
    QuadCorner { pos: [0.0, 0.0] },
    QuadCorner { pos: [1.0, 0.0] },
    QuadCorner { pos: [1.0, 1.0] },
    QuadCorner { pos: [0.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SolidInstance {
    origin: [f32; 2],
    size: [f32; 2],
    color: [f32; 4],
}

impl SolidInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // size
        3 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SolidInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn srgb_targets_get_linear_colors() {
        let grey = Color::from_rgba8(0x80, 0x80, 0x80, 0xff);
        let linear = target_color(grey, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_approx_eq!(linear[0], 0.2158605, 1e-4);
        assert_approx_eq!(linear[3], 1.0);

        let raw = target_color(grey, wgpu::TextureFormat::Bgra8Unorm);
        assert_approx_eq!(raw[0], 128.0 / 255.0);
    }

    #[test]
    fn srgb_curve_endpoints() {
        assert_approx_eq!(srgb_to_linear(0.0), 0.0);
        assert_approx_eq!(srgb_to_linear(1.0), 1.0);
    }
}
