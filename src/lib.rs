pub mod error;
pub mod pipeline;
pub mod reflection;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use error::{ReflectionError, Result};
pub use reflection::PlanarReflectionFeature;
pub use settings::ReflectionSettings;

use pipeline::{render_camera, FrameContext, RenderBackend, RendererFeature, TargetDescriptor};
use scene::Scene;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Culls `scene` and renders one camera frame through `features`.
pub fn render_scene(
    scene: &Scene,
    backend: &mut dyn RenderBackend,
    camera_target: TargetDescriptor,
    features: &mut [&mut dyn RendererFeature],
) {
    let camera = scene.camera_data(camera_target);
    let culling = scene.cull();
    log::debug!("Rendering camera with {} visible objects", culling.len());
    let mut ctx = FrameContext::new(backend, &camera, &culling, &scene.meshes);
    render_camera(features, &mut ctx);
}
