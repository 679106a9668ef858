// scene/demo.rs
use glam::{Quat, Vec3};
use log::info;

use super::components::Material;
use crate::pipeline::LayerMask;
use crate::renderer::Mesh;
use crate::scene::{Camera, Scene, Transform};
use crate::settings::ReflectionSettings;

/// Layer the floor sits on; reflection features should exclude it.
pub const FLOOR_LAYER: u8 = 4;

/// Culling mask that reflects everything except the floor.
pub fn demo_culling_mask() -> LayerMask {
    LayerMask::EVERYTHING.difference(LayerMask::layer(FLOOR_LAYER))
}

/// Adjusts loaded settings for the demo: the floor layer is removed from the
/// configured mask and the debug view is turned on, since the target is
/// released before the frame can be saved.
pub fn demo_settings(mut settings: ReflectionSettings) -> ReflectionSettings {
    let mask = settings.culling_mask.intersection(demo_culling_mask());
    if mask != settings.culling_mask {
        info!(
            "Removing floor layer {} from culling mask {:#x}",
            FLOOR_LAYER,
            settings.culling_mask.bits()
        );
        settings.culling_mask = mask;
    }
    if !settings.debug_view {
        info!("Enabling debug view so the reflection lands on the camera image");
        settings.debug_view = true;
    }
    settings
}

/// A grey floor at `y = 0` with opaque and transparent cubes standing on it.
pub fn reflection_demo_scene() -> Scene {
    info!("Creating reflection demo scene...");

    let mut scene = Scene::new();
    let cube = scene.add_mesh(Mesh::cube());
    let floor = scene.add_mesh(Mesh::plane(12.0));

    scene
        .entity()
        .with_name("Floor")
        .with_transform(Transform::default())
        .with_mesh(floor)
        .with_material(Material::unreflected([0.35, 0.35, 0.4, 1.0]))
        .on_layer(FLOOR_LAYER)
        .spawn();

    scene
        .entity()
        .with_name("Red Cube")
        .with_transform(Transform::at(Vec3::new(-1.8, 0.5, 0.0)))
        .with_mesh(cube)
        .with_material(Material::opaque([0.9, 0.15, 0.1, 1.0]))
        .spawn();

    scene
        .entity()
        .with_name("Green Cube")
        .with_transform(
            Transform::at(Vec3::new(0.6, 0.75, -1.0))
                .with_rotation(Quat::from_rotation_y(0.6))
                .with_uniform_scale(1.5),
        )
        .with_mesh(cube)
        .with_material(Material::opaque([0.2, 0.8, 0.3, 1.0]))
        .spawn();

    scene
        .entity()
        .with_name("Glass Cube")
        .with_transform(Transform::at(Vec3::new(2.2, 0.75, 0.8)).with_uniform_scale(1.5))
        .with_mesh(cube)
        .with_material(Material::transparent([0.2, 0.4, 1.0, 0.45]))
        .spawn();

    scene.set_camera(Camera {
        eye: Vec3::new(0.0, 3.0, 9.0),
        target: Vec3::new(0.0, 0.0, 0.0),
        ..Camera::default()
    });

    scene
}
