use glam::{Mat4, Vec3};

use crate::settings::ReflectionSettings;

/// Subtracted from the plane height published to shaders so geometry resting
/// exactly on the plane is not clipped.
pub const PLANE_HEIGHT_EPSILON: f32 = 0.01;

/// Identity with a vertical translation of `thickness - height`.
pub fn translate_matrix(height: f32, thickness: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, thickness - height, 0.0))
}

/// Identity with the Y basis negated.
pub fn reflect_matrix() -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
}

/// Flips clip-space Y for APIs that render textures upside down.
pub fn gpu_projection(projection: Mat4, flip_y: bool) -> Mat4 {
    if flip_y {
        Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * projection
    } else {
        projection
    }
}

/// Mirror transforms for one feature build, shared by every pass of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorMatrices {
    pub height: f32,
    pub thickness: f32,
    pub translate: Mat4,
    pub reflect: Mat4,
}

impl MirrorMatrices {
    pub fn new(height: f32, thickness: f32) -> Self {
        Self {
            height,
            thickness,
            translate: translate_matrix(height, thickness),
            reflect: reflect_matrix(),
        }
    }

    pub fn from_settings(settings: &ReflectionSettings) -> Self {
        Self::new(settings.plane_height, settings.plane_thickness)
    }

    /// `reflect * translate`: moves the plane to the origin, then flips Y.
    pub fn mirror(&self) -> Mat4 {
        self.reflect * self.translate
    }

    /// View matrix of the mirrored camera.
    pub fn mirrored_view(&self, base_view: Mat4) -> Mat4 {
        base_view * self.mirror()
    }

    /// World-space reflection of `point` about the plane `y = height`, with the
    /// thickness folded into the offset the same way the view is.
    pub fn reflect_point(&self, point: Vec3) -> Vec3 {
        (self.translate.inverse() * self.mirror()).transform_point3(point)
    }
}
