// scene/mod.rs

pub mod builder;
pub mod camera;
pub mod components;
pub mod demo;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use builder::EntityBuilder;
pub use camera::Camera;
pub use demo::{demo_culling_mask, demo_settings, reflection_demo_scene, FLOOR_LAYER};
pub use scene::Scene;
pub use transform::Transform;

pub use components::{
    Layer, Material, MaterialComponent, MeshComponent, Name, TransformComponent, Visible,
};
