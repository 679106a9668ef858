// scene/scene.rs
use hecs::World;

use super::components::*;
use crate::pipeline::{CameraData, CullingResults, TargetDescriptor, VisibleObject};
use crate::renderer::{Mesh, MeshId, MeshStore};
use crate::scene::{Camera, EntityBuilder};

/// An ECS world with its meshes and the camera it is viewed through.
pub struct Scene {
    pub world: World,
    pub meshes: MeshStore,
    camera: Camera,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            meshes: MeshStore::new(),
            camera: Camera::default(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.add(mesh)
    }

    pub fn entity(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(&mut self.world)
    }

    pub fn camera_data(&self, descriptor: TargetDescriptor) -> CameraData {
        self.camera.frame_data(descriptor)
    }

    /// Collects every visible renderable. Entities without a `Visible`
    /// component count as visible; a missing `Layer` means layer 0.
    pub fn cull(&self) -> CullingResults {
        let visible = self
            .world
            .query::<(
                &TransformComponent,
                &MeshComponent,
                &MaterialComponent,
                Option<&Layer>,
                Option<&Visible>,
            )>()
            .iter()
            .filter(|(_entity, (_, _, _, _, visible))| visible.map_or(true, |v| v.0))
            .map(|(_entity, (transform, mesh, material, layer, _))| VisibleObject {
                mesh: mesh.0,
                model: transform.0.matrix(),
                color: material.0.color,
                layer: layer.copied().unwrap_or_default().0,
                render_queue: material.0.render_queue,
                passes: material.0.passes,
            })
            .collect();
        CullingResults::new(visible)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;
    use glam::Vec3;

    #[test]
    fn cull_skips_hidden_entities_and_defaults_layer() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(Mesh::cube());
        scene
            .entity()
            .with_transform(Transform::at(Vec3::Y))
            .with_mesh(cube)
            .with_material(Material::opaque([1.0, 0.0, 0.0, 1.0]))
            .spawn();
        scene
            .entity()
            .with_transform(Transform::default())
            .with_mesh(cube)
            .with_material(Material::opaque([0.0, 1.0, 0.0, 1.0]))
            .visible(false)
            .spawn();
        scene
            .entity()
            .with_transform(Transform::default())
            .with_mesh(cube)
            .with_material(Material::transparent([0.0, 0.0, 1.0, 0.5]))
            .on_layer(3)
            .spawn();

        let culled = scene.cull();
        assert_eq!(culled.len(), 2);
        let layers: Vec<u8> = culled.visible().iter().map(|o| o.layer).collect();
        assert!(layers.contains(&0) && layers.contains(&3));
        assert!(culled
            .visible()
            .iter()
            .all(|o| o.color != [0.0, 1.0, 0.0, 1.0]));
    }
}
