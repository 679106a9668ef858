#![allow(dead_code)]

use glam::{Mat4, Vec3};
use planar_reflection::pipeline::{
    ClearColor, DrawItem, PropertyId, RenderBackend, RendererFeature, ShaderTag,
    TargetDescriptor, TargetHandle,
};
use planar_reflection::reflection::REFLECTION_TEXTURE_ID;
use planar_reflection::renderer::{Mesh, MeshStore, SoftwareBackend};
use planar_reflection::scene::{Camera, Material, Scene, Transform};
use planar_reflection::{render_scene, PlanarReflectionFeature};

pub const SIZE: u32 = 64;
pub const CUBE_COLOR: [f32; 4] = [0.8, 0.2, 0.1, 1.0];
pub const BACKGROUND: ClearColor = ClearColor {
    r: 0.1,
    g: 0.3,
    b: 0.5,
    a: 1.0,
};

/// Software backend that keeps a copy of the reflection target's pixels
/// taken just before the target is released.
pub struct CapturingBackend {
    pub inner: SoftwareBackend,
    pub captured: Option<Vec<[f32; 4]>>,
}

impl CapturingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: SoftwareBackend::new(width, height),
            captured: None,
        }
    }

    pub fn captured_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let pixels = self.captured.as_ref().expect("reflection target was never released");
        pixels[(y * SIZE + x) as usize]
    }
}

impl RenderBackend for CapturingBackend {
    fn alloc_target_handle(&mut self, id: PropertyId) -> TargetHandle {
        self.inner.alloc_target_handle(id)
    }

    fn release_target_handle(&mut self, handle: TargetHandle) {
        self.inner.release_target_handle(handle)
    }

    fn get_temporary_target(&mut self, id: PropertyId, descriptor: &TargetDescriptor) {
        self.inner.get_temporary_target(id, descriptor)
    }

    fn release_temporary_target(&mut self, id: PropertyId) {
        if id == REFLECTION_TEXTURE_ID {
            self.captured = self.inner.target_pixels(id).map(<[_]>::to_vec);
        }
        self.inner.release_temporary_target(id)
    }

    fn set_render_target(&mut self, id: PropertyId, clear: Option<ClearColor>) {
        self.inner.set_render_target(id, clear)
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.inner.set_view_projection(view, projection)
    }

    fn set_invert_culling(&mut self, invert: bool) {
        self.inner.set_invert_culling(invert)
    }

    fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.inner.set_global_float(id, value)
    }

    fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.inner.global_float(id)
    }

    fn draw(&mut self, meshes: &MeshStore, items: &[DrawItem], tag: ShaderTag) {
        self.inner.draw(meshes, items, tag)
    }

    fn blit_to_camera(&mut self, source: PropertyId) {
        self.inner.blit_to_camera(source)
    }

    fn has_temporary_target(&self, id: PropertyId) -> bool {
        self.inner.has_temporary_target(id)
    }

    fn flush(&mut self) {
        self.inner.flush()
    }
}

/// Camera on the +Z axis looking at the origin.
pub fn front_camera() -> Camera {
    Camera {
        eye: Vec3::new(0.0, 0.0, 10.0),
        target: Vec3::ZERO,
        ..Camera::default()
    }
}

/// One unit cube per `(position, material)`, seen by [`front_camera`].
pub fn scene_with(objects: &[(Vec3, Material)]) -> Scene {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(Mesh::cube());
    for (position, material) in objects {
        scene
            .entity()
            .with_transform(Transform::at(*position))
            .with_mesh(cube)
            .with_material(*material)
            .spawn();
    }
    scene.set_camera(front_camera());
    scene
}

pub fn cube_scene() -> Scene {
    scene_with(&[(Vec3::new(0.0, 3.0, 0.0), Material::opaque(CUBE_COLOR))])
}

pub fn camera_target() -> TargetDescriptor {
    TargetDescriptor::new(SIZE, SIZE)
}

pub fn render_frame(
    scene: &Scene,
    backend: &mut dyn RenderBackend,
    feature: &mut PlanarReflectionFeature,
) {
    let mut features: [&mut dyn RendererFeature; 1] = [feature];
    render_scene(scene, backend, camera_target(), &mut features);
}

/// Pixel containing the projection of `world` for a square camera of [`SIZE`].
pub fn screen_pixel(scene: &Scene, world: Vec3) -> (u32, u32) {
    let view_proj = scene.camera().view_proj(1.0);
    let ndc = view_proj.project_point3(world);
    let x = (ndc.x * 0.5 + 0.5) * SIZE as f32;
    let y = (0.5 - ndc.y * 0.5) * SIZE as f32;
    (x as u32, y as u32)
}

pub fn approx_color(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
}
