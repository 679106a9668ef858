// scene/builder.rs
// Optional helper for building entities - uses pure hecs

use hecs::World;

use super::components::*;
use crate::renderer::MeshId;
use crate::scene::Transform;

/// Helper for building entities with a fluent API
/// This is optional - you can also use world.spawn() directly
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    builder: hecs::EntityBuilder,
}

impl<'w> EntityBuilder<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self {
            world,
            builder: hecs::EntityBuilder::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.builder.add(MaterialComponent(material));
        self
    }

    pub fn on_layer(mut self, layer: u8) -> Self {
        self.builder.add(Layer(layer));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.builder.add(Visible(visible));
        self
    }

    /// Spawn the entity into the world
    pub fn spawn(&mut self) -> hecs::Entity {
        self.world.spawn(self.builder.build())
    }
}
