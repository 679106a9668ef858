//! CPU reference implementation of [`RenderBackend`].
//!
//! Rasterizes the same shader passes the GPU backend does, one pixel at a time,
//! so reflection frames can be rendered and inspected headless. Conventions
//! match wgpu: right-handed view space, NDC depth in `[0, 1]`, counter-clockwise
//! front faces and a top-left pixel origin.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::pipeline::{
    BackendStats, ClearColor, DrawItem, PropertyId, RenderBackend, ShaderTag, TargetDescriptor,
    TargetHandle, TextureFilter,
};
use crate::reflection::PLANE_HEIGHT_ID;
use crate::renderer::{MeshStore, Vertex};

/// Triangles with a vertex this close to the camera plane are dropped.
const NEAR_W_EPSILON: f32 = 1e-5;

/// Command recorded by [`SoftwareBackend`], in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    AllocHandle(PropertyId),
    ReleaseHandle(PropertyId),
    GetTemporary(PropertyId, TargetDescriptor),
    ReleaseTemporary(PropertyId),
    SetRenderTarget { id: PropertyId, clear: bool },
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetInvertCulling(bool),
    SetGlobal(PropertyId, f32),
    Draw { tag: ShaderTag, count: usize },
    Blit(PropertyId),
    Flush,
}

#[derive(Debug, Clone)]
struct SoftTarget {
    descriptor: TargetDescriptor,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
}

impl SoftTarget {
    fn new(descriptor: TargetDescriptor) -> Self {
        let count = descriptor.pixel_count();
        Self {
            descriptor,
            color: vec![[0.0; 4]; count],
            depth: vec![1.0; count],
        }
    }

    fn clear(&mut self, color: ClearColor) {
        self.color.fill(color.to_array());
        self.depth.fill(1.0);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.descriptor.width as usize + x as usize
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.descriptor.width as i64 - 1) as u32;
        let y = y.clamp(0, self.descriptor.height as i64 - 1) as u32;
        self.color[self.index(x, y)]
    }

    /// Samples at normalized `uv` (top-left origin) with clamp-to-edge addressing.
    fn sample(&self, uv: Vec2, filter: TextureFilter) -> [f32; 4] {
        let x = uv.x * self.descriptor.width as f32 - 0.5;
        let y = uv.y * self.descriptor.height as f32 - 0.5;
        match filter {
            TextureFilter::Point => self.texel(x.round() as i64, y.round() as i64),
            TextureFilter::Bilinear | TextureFilter::Trilinear => {
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let a = Vec4::from(self.texel(x0, y0));
                let b = Vec4::from(self.texel(x0 + 1, y0));
                let c = Vec4::from(self.texel(x0, y0 + 1));
                let d = Vec4::from(self.texel(x0 + 1, y0 + 1));
                a.lerp(b, fx).lerp(c.lerp(d, fx), fy).to_array()
            }
        }
    }

    fn store(&mut self, index: usize, value: [f32; 4]) {
        self.color[index] = if self.descriptor.format.is_ldr() {
            value.map(|channel| channel.clamp(0.0, 1.0))
        } else {
            value
        };
    }
}

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Fixed-function state for one draw call.
struct Rasterizer {
    view_proj: Mat4,
    invert_culling: bool,
    plane_height: f32,
    tag: ShaderTag,
}

impl Rasterizer {
    fn triangle(&self, target: &mut SoftTarget, item: &DrawItem, tri: [&Vertex; 3]) {
        let world = tri.map(|vertex| item.model * Vec3::from(vertex.pos).extend(1.0));
        let clip = world.map(|position| self.view_proj * position);
        if clip.iter().any(|c| c.w <= NEAR_W_EPSILON) {
            return;
        }
        let ndc = clip.map(|c| c.truncate() / c.w);

        let signed_area = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
            - (ndc[2].x - ndc[0].x) * (ndc[1].y - ndc[0].y);
        if signed_area == 0.0 {
            return;
        }
        // Back-face cull: front faces are CCW unless the winding is inverted.
        let counter_clockwise = signed_area > 0.0;
        if counter_clockwise == self.invert_culling {
            return;
        }

        let width = target.descriptor.width as f32;
        let height = target.descriptor.height as f32;
        let screen = ndc.map(|p| Vec2::new((p.x * 0.5 + 0.5) * width, (0.5 - p.y * 0.5) * height));
        let area = edge(screen[0], screen[1], screen[2]);
        if area == 0.0 {
            return;
        }

        let min = screen[0].min(screen[1]).min(screen[2]).floor().max(Vec2::ZERO);
        let max = screen[0]
            .max(screen[1])
            .max(screen[2])
            .ceil()
            .min(Vec2::new(width - 1.0, height - 1.0));
        if min.x > max.x || min.y > max.y {
            return;
        }

        let inv_w = clip.map(|c| 1.0 / c.w);
        for py in min.y as u32..=max.y as u32 {
            for px in min.x as u32..=max.x as u32 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let b = [
                    edge(screen[1], screen[2], p) / area,
                    edge(screen[2], screen[0], p) / area,
                    edge(screen[0], screen[1], p) / area,
                ];
                if b.iter().any(|weight| *weight < 0.0) {
                    continue;
                }

                let z = b[0] * ndc[0].z + b[1] * ndc[1].z + b[2] * ndc[2].z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let denom = b[0] * inv_w[0] + b[1] * inv_w[1] + b[2] * inv_w[2];
                let world_y = (b[0] * world[0].y * inv_w[0]
                    + b[1] * world[1].y * inv_w[1]
                    + b[2] * world[2].y * inv_w[2])
                    / denom;
                // Geometry below the mirror plane never shows up in the reflection.
                if world_y < self.plane_height {
                    continue;
                }

                let index = target.index(px, py);
                if z > target.depth[index] {
                    continue;
                }
                if self.tag.writes_depth() {
                    target.depth[index] = z;
                }
                if !self.tag.writes_color() {
                    continue;
                }

                let src = item.color;
                let value = if self.tag.blends() {
                    let dst = target.color[index];
                    let alpha = src[3];
                    [
                        src[0] * alpha + dst[0] * (1.0 - alpha),
                        src[1] * alpha + dst[1] * (1.0 - alpha),
                        src[2] * alpha + dst[2] * (1.0 - alpha),
                        alpha + dst[3] * (1.0 - alpha),
                    ]
                } else {
                    src
                };
                target.store(index, value);
            }
        }
    }
}

/// Headless backend that rasterizes on the CPU and records every command.
pub struct SoftwareBackend {
    camera: SoftTarget,
    temporaries: HashMap<PropertyId, SoftTarget>,
    pool: Vec<SoftTarget>,
    handles: HashMap<TargetHandle, PropertyId>,
    next_handle: u32,
    bound: Option<PropertyId>,
    view: Mat4,
    projection: Mat4,
    invert_culling: bool,
    globals: HashMap<PropertyId, f32>,
    stats: BackendStats,
    events: Vec<BackendEvent>,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_camera_descriptor(TargetDescriptor::new(width, height))
    }

    pub fn with_camera_descriptor(descriptor: TargetDescriptor) -> Self {
        Self {
            camera: SoftTarget::new(descriptor),
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
            events: Vec::new(),
        }
    }

    pub fn camera_descriptor(&self) -> TargetDescriptor {
        self.camera.descriptor
    }

    pub fn camera_pixels(&self) -> &[[f32; 4]] {
        &self.camera.color
    }

    pub fn camera_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.camera.color[self.camera.index(x, y)]
    }

    /// Fills the camera target, standing in for the host's main scene render.
    pub fn fill_camera(&mut self, color: ClearColor) {
        self.camera.clear(color);
    }

    pub fn target_descriptor(&self, id: PropertyId) -> Option<TargetDescriptor> {
        self.temporaries.get(&id).map(|target| target.descriptor)
    }

    pub fn target_pixels(&self, id: PropertyId) -> Option<&[[f32; 4]]> {
        self.temporaries.get(&id).map(|target| target.color.as_slice())
    }

    pub fn target_pixel(&self, id: PropertyId, x: u32, y: u32) -> Option<[f32; 4]> {
        let target = self.temporaries.get(&id)?;
        if x >= target.descriptor.width || y >= target.descriptor.height {
            return None;
        }
        Some(target.color[target.index(x, y)])
    }

    /// Writes `pixels` into an existing temporary target.
    pub fn upload_target(&mut self, id: PropertyId, pixels: &[[f32; 4]]) -> bool {
        match self.temporaries.get_mut(&id) {
            Some(target) if target.color.len() == pixels.len() => {
                target.color.copy_from_slice(pixels);
                true
            }
            _ => false,
        }
    }

    pub fn is_culling_inverted(&self) -> bool {
        self.invert_culling
    }

    pub fn view_projection(&self) -> (Mat4, Mat4) {
        (self.view, self.projection)
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn camera_image(&self) -> image::RgbaImage {
        to_image(&self.camera)
    }

    pub fn target_image(&self, id: PropertyId) -> Option<image::RgbaImage> {
        self.temporaries.get(&id).map(to_image)
    }

    fn take_pooled(&mut self, descriptor: &TargetDescriptor) -> SoftTarget {
        match self
            .pool
            .iter()
            .position(|target| target.descriptor == *descriptor)
        {
            Some(index) => self.pool.swap_remove(index),
            None => {
                self.stats.textures_created += 1;
                log::debug!(
                    "Creating {}x{} {:?} software target",
                    descriptor.width,
                    descriptor.height,
                    descriptor.format
                );
                SoftTarget::new(*descriptor)
            }
        }
    }
}

fn to_image(target: &SoftTarget) -> image::RgbaImage {
    rgba_image(target.descriptor.width, target.descriptor.height, &target.color)
}

/// Quantizes row-major float pixels to an 8-bit image.
pub fn rgba_image(width: u32, height: u32, pixels: &[[f32; 4]]) -> image::RgbaImage {
    image::RgbaImage::from_fn(width, height, |x, y| {
        let texel = pixels
            .get(y as usize * width as usize + x as usize)
            .copied()
            .unwrap_or_default();
        image::Rgba(texel.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

impl RenderBackend for SoftwareBackend {
    fn alloc_target_handle(&mut self, id: PropertyId) -> TargetHandle {
        let handle = TargetHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, id);
        self.stats.handles_allocated += 1;
        self.events.push(BackendEvent::AllocHandle(id));
        handle
    }

    fn release_target_handle(&mut self, handle: TargetHandle) {
        match self.handles.remove(&handle) {
            Some(id) => {
                self.stats.handles_released += 1;
                self.events.push(BackendEvent::ReleaseHandle(id));
            }
            None => log::warn!("Release of unknown target handle {:?}", handle),
        }
    }

    fn get_temporary_target(&mut self, id: PropertyId, descriptor: &TargetDescriptor) {
        self.stats.temporaries_requested += 1;
        self.events
            .push(BackendEvent::GetTemporary(id, *descriptor));

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
        self.events.push(BackendEvent::ReleaseTemporary(id));
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
        self.events.push(BackendEvent::SetRenderTarget {
            id,
            clear: clear.is_some(),
        });
        match self.temporaries.get_mut(&id) {
            Some(target) => {
                if let Some(color) = clear {
                    target.clear(color);
                }
                self.bound = Some(id);
            }
            None => {
                log::warn!("Binding missing render target {:?}; draws will be dropped", id);
                self.bound = None;
            }
        }
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.events
            .push(BackendEvent::SetViewProjection { view, projection });
    }

    fn set_invert_culling(&mut self, invert: bool) {
        self.invert_culling = invert;
        self.events.push(BackendEvent::SetInvertCulling(invert));
    }

    fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.globals.insert(id, value);
        self.events.push(BackendEvent::SetGlobal(id, value));
    }

    fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.globals.get(&id).copied()
    }

    fn draw(&mut self, meshes: &MeshStore, items: &[DrawItem], tag: ShaderTag) {
        self.events.push(BackendEvent::Draw {
            tag,
            count: items.len(),
        });

        let rasterizer = Rasterizer {
            view_proj: self.projection * self.view,
            invert_culling: self.invert_culling,
            plane_height: self
                .globals
                .get(&PLANE_HEIGHT_ID)
                .copied()
                .unwrap_or(f32::NEG_INFINITY),
            tag,
        };

        let Some(target) = self.bound.and_then(|id| self.temporaries.get_mut(&id)) else {
            log::warn!("Draw {:?} with no render target bound", tag.name());
            return;
        };

        for item in items {
            let Some(mesh) = meshes.get(item.mesh) else {
                continue;
            };
            for tri in mesh.triangles() {
                rasterizer.triangle(target, item, tri);
            }
        }
    }

    fn blit_to_camera(&mut self, source: PropertyId) {
        self.events.push(BackendEvent::Blit(source));
        let Some(source) = self.temporaries.get(&source) else {
            log::warn!("Blit from missing target {:?}", source);
            return;
        };

        let destination = &mut self.camera;
        let same_size = source.descriptor.width == destination.descriptor.width
            && source.descriptor.height == destination.descriptor.height;
        if same_size {
            for index in 0..destination.color.len() {
                destination.store(index, source.color[index]);
            }
            return;
        }

        let width = destination.descriptor.width;
        let height = destination.descriptor.height;
        for y in 0..height {
            for x in 0..width {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / width as f32,
                    (y as f32 + 0.5) / height as f32,
                );
                let value = source.sample(uv, source.descriptor.filter);
                let index = destination.index(x, y);
                destination.store(index, value);
            }
        }
    }

    fn has_temporary_target(&self, id: PropertyId) -> bool {
        self.temporaries.contains_key(&id)
    }

    fn flush(&mut self) {
        self.events.push(BackendEvent::Flush);
    }
}
