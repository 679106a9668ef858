use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::error::{ReflectionError, Result};
use crate::pipeline::{
    BackendStats, ClearColor, DrawItem, PropertyId, RenderBackend, ShaderTag, TargetDescriptor,
    TargetHandle,
};
use crate::reflection::{FADE_BASE_HEIGHT_ID, FADE_RANGE_ID, PLANE_HEIGHT_ID};
use crate::renderer::{
    Blitter, Depth, GpuContext, GpuTarget, MeshId, MeshStore, PipelineBuilder, Vertex,
};

/// Dynamic-offset stride for [`DrawUniform`]; the default uniform offset alignment.
const DRAW_UNIFORM_STRIDE: u64 = 256;

/// Per-draw constants read by `reflection.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    /// x: plane height, y: fade base height, z: fade range.
    plane: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    tag: ShaderTag,
    invert_culling: bool,
    format: wgpu::TextureFormat,
}

/// [`RenderBackend`] recording into wgpu command encoders.
///
/// Commands accumulate in one encoder that `flush` submits, so targets written
/// by one pass are visible to the next.
pub struct WgpuBackend {
    context: GpuContext,
    camera: GpuTarget,
    temporaries: HashMap<PropertyId, GpuTarget>,
    pool: Vec<GpuTarget>,
    handles: HashMap<TargetHandle, PropertyId>,
    next_handle: u32,
    bound: Option<PropertyId>,
    view: Mat4,
    projection: Mat4,
    invert_culling: bool,
    globals: HashMap<PropertyId, f32>,
    stats: BackendStats,
    encoder: Option<wgpu::CommandEncoder>,
    meshes: HashMap<MeshId, GpuMesh>,
    shader: wgpu::ShaderModule,
    draw_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    blitter: Blitter,
}

impl WgpuBackend {
    pub fn new(context: GpuContext, camera: TargetDescriptor) -> Self {
        let device = &context.device;
        let camera = GpuTarget::new(device, &camera, "Camera Color");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Reflection Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/reflection.wgsl").into()),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DrawBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Reflection Pipeline Layout"),
            bind_group_layouts: &[&draw_layout],
            push_constant_ranges: &[],
        });

        let blitter = Blitter::new(device);

        Self {
            context,
            camera,
            temporaries: HashMap::new(),
            pool: Vec::new(),
            handles: HashMap::new(),
            next_handle: 1,
            bound: None,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            invert_culling: false,
            globals: HashMap::new(),
            stats: BackendStats::default(),
            encoder: None,
            meshes: HashMap::new(),
            shader,
            draw_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            blitter,
        }
    }

    pub fn camera_descriptor(&self) -> TargetDescriptor {
        self.camera.descriptor
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Clears the camera target, standing in for the host's main scene render.
    pub fn fill_camera(&mut self, color: ClearColor) {
        let mut encoder = self.take_encoder();
        self.camera.clear(&mut encoder, to_wgpu_color(color));
        self.encoder = Some(encoder);
    }

    pub fn read_camera(&mut self) -> Result<Vec<[f32; 4]>> {
        self.flush();
        self.context.read_pixels(&self.camera)
    }

    pub fn read_target(&mut self, id: PropertyId) -> Result<Vec<[f32; 4]>> {
        self.flush();
        let target = self
            .temporaries
            .get(&id)
            .ok_or(ReflectionError::MissingTarget(id))?;
        self.context.read_pixels(target)
    }

    fn take_encoder(&mut self) -> wgpu::CommandEncoder {
        self.encoder.take().unwrap_or_else(|| {
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Reflection Encoder"),
                })
        })
    }

    fn take_pooled(&mut self, descriptor: &TargetDescriptor) -> GpuTarget {
        match self
            .pool
            .iter()
            .position(|target| target.descriptor == *descriptor)
        {
            Some(index) => self.pool.swap_remove(index),
            None => {
                self.stats.textures_created += 1;
                log::debug!(
                    "Creating {}x{} {:?} reflection texture",
                    descriptor.width,
                    descriptor.height,
                    descriptor.format
                );
                GpuTarget::new(&self.context.device, descriptor, "Temporary Target")
            }
        }
    }

    fn upload_mesh(&mut self, meshes: &MeshStore, id: MeshId) {
        if self.meshes.contains_key(&id) {
            return;
        }
        let Some(mesh) = meshes.get(id) else {
            return;
        };
        let device = &self.context.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.insert(
            id,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as u32,
            },
        );
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let mut builder = PipelineBuilder::new(
            &self.context.device,
            &self.pipeline_layout,
            &self.shader,
        )
        .with_label(key.tag.name())
        .with_vertex_buffer(Vertex::layout())
        .with_inverted_winding(key.invert_culling)
        .with_depth_stencil(
            Depth::FORMAT,
            key.tag.writes_depth(),
            wgpu::CompareFunction::LessEqual,
        );
        builder = match key.tag {
            ShaderTag::DepthOnly => builder.with_fragment_entry("fs_depth"),
            ShaderTag::ReflectionOpaque => builder.with_color_target(key.format, None),
            ShaderTag::ReflectionTransparent => {
                builder.with_color_target(key.format, Some(wgpu::BlendState::ALPHA_BLENDING))
            }
        };
        self.pipelines.insert(key, builder.build());
    }

    fn draw_uniforms(&self, items: &[DrawItem]) -> Vec<u8> {
        let view_proj = (self.projection * self.view).to_cols_array_2d();
        let plane = [
            self.globals
                .get(&PLANE_HEIGHT_ID)
                .copied()
                .unwrap_or(f32::MIN),
            self.globals.get(&FADE_BASE_HEIGHT_ID).copied().unwrap_or(0.0),
            self.globals.get(&FADE_RANGE_ID).copied().unwrap_or(0.0),
            0.0,
        ];

        let mut bytes = vec![0u8; items.len() * DRAW_UNIFORM_STRIDE as usize];
        for (i, item) in items.iter().enumerate() {
            let uniform = DrawUniform {
                view_proj,
                model: item.model.to_cols_array_2d(),
                color: item.color,
                plane,
            };
            let start = i * DRAW_UNIFORM_STRIDE as usize;
            bytes[start..start + std::mem::size_of::<DrawUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        bytes
    }
}

fn to_wgpu_color(color: ClearColor) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

impl RenderBackend for WgpuBackend {
    fn alloc_target_handle(&mut self, id: PropertyId) -> TargetHandle {
        let handle = TargetHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, id);
        self.stats.handles_allocated += 1;
        handle
    }

    fn release_target_handle(&mut self, handle: TargetHandle) {
        if self.handles.remove(&handle).is_some() {
            self.stats.handles_released += 1;
        } else {
            log::warn!("Release of unknown target handle {:?}", handle);
        }
    }

    fn get_temporary_target(&mut self, id: PropertyId, descriptor: &TargetDescriptor) {
        self.stats.temporaries_requested += 1;
        if let Some(existing) = self.temporaries.get(&id) {
            if existing.descriptor == *descriptor {
                return;
            }
        }
        let target = self.take_pooled(descriptor);
        if let Some(previous) = self.temporaries.insert(id, target) {
            self.pool.push(previous);
        }
    }

    fn release_temporary_target(&mut self, id: PropertyId) {
        match self.temporaries.remove(&id) {
            Some(target) => {
                self.stats.temporaries_released += 1;
                self.pool.push(target);
                if self.bound == Some(id) {
                    self.bound = None;
                }
            }
            None => log::warn!("Release of unknown temporary target {:?}", id),
        }
    }

    fn set_render_target(&mut self, id: PropertyId, clear: Option<ClearColor>) {
        if !self.temporaries.contains_key(&id) {
            log::warn!("Binding missing render target {:?}; draws will be dropped", id);
            self.bound = None;
            return;
        }
        self.bound = Some(id);
        if let Some(color) = clear {
            let mut encoder = self.take_encoder();
            if let Some(target) = self.temporaries.get(&id) {
                target.clear(&mut encoder, to_wgpu_color(color));
            }
            self.encoder = Some(encoder);
        }
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }

    fn set_invert_culling(&mut self, invert: bool) {
        self.invert_culling = invert;
    }

    fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.globals.insert(id, value);
    }

    fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.globals.get(&id).copied()
    }

    fn draw(&mut self, meshes: &MeshStore, items: &[DrawItem], tag: ShaderTag) {
        let Some(format) = self
            .bound
            .and_then(|id| self.temporaries.get(&id))
            .map(|target| target.descriptor.format.to_wgpu())
        else {
            log::warn!("Draw {:?} with no render target bound", tag.name());
            return;
        };
        if items.is_empty() {
            return;
        }

        for item in items {
            self.upload_mesh(meshes, item.mesh);
        }
        let key = PipelineKey {
            tag,
            invert_culling: self.invert_culling,
            format,
        };
        self.ensure_pipeline(key);

        let uniforms = self.draw_uniforms(items);
        let device = &self.context.device;
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Draw Uniforms"),
            contents: &uniforms,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &self.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });

        let mut encoder = self.take_encoder();
        {
            let Some(target) = self.bound.and_then(|id| self.temporaries.get(&id)) else {
                self.encoder = Some(encoder);
                return;
            };
            let color_attachments = if tag.writes_color() {
                vec![Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })]
            } else {
                Vec::new()
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(tag.name()),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(pipeline) = self.pipelines.get(&key) {
                rpass.set_pipeline(pipeline);
            }

            for (i, item) in items.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&item.mesh) else {
                    continue;
                };
                let offset = (i as u64 * DRAW_UNIFORM_STRIDE) as u32;
                rpass.set_bind_group(0, &bind_group, &[offset]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.encoder = Some(encoder);
    }

    fn blit_to_camera(&mut self, source: PropertyId) {
        let mut encoder = self.take_encoder();
        match self.temporaries.get(&source) {
            Some(target) => {
                self.blitter
                    .blit(&self.context.device, &mut encoder, target, &self.camera)
            }
            None => log::warn!("Blit from missing target {:?}", source),
        }
        self.encoder = Some(encoder);
    }

    fn has_temporary_target(&self, id: PropertyId) -> bool {
        self.temporaries.contains_key(&id)
    }

    fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.context.queue.submit(std::iter::once(encoder.finish()));
        }
    }
}
