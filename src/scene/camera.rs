use glam::{Mat4, Vec3};

use crate::pipeline::{CameraData, TargetDescriptor};

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    /// Reported to passes as the render-to-texture projection flip.
    pub flip_projection: bool,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    /// Per-frame camera values for a color target described by `descriptor`.
    pub fn frame_data(&self, descriptor: TargetDescriptor) -> CameraData {
        let aspect = descriptor.width as f32 / descriptor.height.max(1) as f32;
        let mut data = CameraData::new(self.view(), self.proj(aspect), descriptor);
        data.position = self.eye;
        data.projection_flipped = self.flip_projection;
        data
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: 60f32.to_radians(),
            near: 0.1,
            far: 100.0,
            flip_projection: false,
        }
    }
}
