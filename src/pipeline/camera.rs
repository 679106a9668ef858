use glam::{Mat4, Vec3};

use crate::pipeline::backend::TargetDescriptor;
use crate::pipeline::filter::SortingCriteria;

/// Per-camera values the host hands to every pass of a frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraData {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    /// Descriptor of the camera's color target.
    pub descriptor: TargetDescriptor,
    pub opaque_sorting: SortingCriteria,
    /// Set when the graphics API expects render-to-texture projections to be
    /// flipped vertically.
    pub projection_flipped: bool,
}

impl CameraData {
    pub fn new(view: Mat4, projection: Mat4, descriptor: TargetDescriptor) -> Self {
        let position = view.inverse().w_axis.truncate();
        Self {
            view,
            projection,
            position,
            descriptor,
            opaque_sorting: SortingCriteria::CommonOpaque,
            projection_flipped: false,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.descriptor.width as f32 / self.descriptor.height.max(1) as f32
    }
}
