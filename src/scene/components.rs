// scene/components.rs
// Pure hecs components

use crate::pipeline::{RenderQueueRange, ShaderPasses};
use crate::renderer::MeshId;
use crate::scene::Transform;

/// Transform component (position, rotation, scale)
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// Mesh component
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub MeshId);

/// Flat-colored material with the shader passes it provides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub render_queue: u32,
    pub passes: ShaderPasses,
}

impl Material {
    pub const OPAQUE_QUEUE: u32 = 2000;
    pub const TRANSPARENT_QUEUE: u32 = 3000;

    /// Opaque material drawn by the depth and opaque reflection passes.
    pub fn opaque(color: [f32; 4]) -> Self {
        Self {
            color,
            render_queue: Self::OPAQUE_QUEUE,
            passes: ShaderPasses::OPAQUE,
        }
    }

    /// Alpha-blended material drawn by the transparent reflection pass.
    pub fn transparent(color: [f32; 4]) -> Self {
        Self {
            color,
            render_queue: Self::TRANSPARENT_QUEUE,
            passes: ShaderPasses::REFLECTION_TRANSPARENT,
        }
    }

    /// Material without reflection passes, such as the mirror surface itself.
    pub fn unreflected(color: [f32; 4]) -> Self {
        Self {
            color,
            render_queue: Self::OPAQUE_QUEUE,
            passes: ShaderPasses::empty(),
        }
    }

    pub fn is_transparent(&self) -> bool {
        RenderQueueRange::TRANSPARENT.contains(self.render_queue)
    }
}

/// Material component
#[derive(Debug, Clone, Copy)]
pub struct MaterialComponent(pub Material);

/// Object layer, tested against a feature's culling mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layer(pub u8);

/// Visibility component
#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
