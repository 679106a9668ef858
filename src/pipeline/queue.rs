use crate::pipeline::backend::RenderBackend;
use crate::pipeline::camera::CameraData;
use crate::pipeline::event::RenderPassEvent;
use crate::pipeline::filter::{CullingResults, DrawSettings, FilterSpec};
use crate::renderer::MeshStore;

/// Everything a pass can touch while a camera is rendered.
pub struct FrameContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub camera: &'a CameraData,
    pub culling: &'a CullingResults,
    pub meshes: &'a MeshStore,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        backend: &'a mut dyn RenderBackend,
        camera: &'a CameraData,
        culling: &'a CullingResults,
        meshes: &'a MeshStore,
    ) -> Self {
        Self {
            backend,
            camera,
            culling,
            meshes,
        }
    }

    /// Selects the culled objects matching `filter`, sorts them per `draw` and
    /// submits them to the bound target. Returns the number of objects drawn.
    pub fn draw_renderers(&mut self, draw: &DrawSettings, filter: &FilterSpec) -> usize {
        let items = self.culling.select(filter, draw, self.camera.position);
        if !items.is_empty() {
            self.backend.draw(self.meshes, &items, draw.tag);
        }
        items.len()
    }
}

/// A unit of per-camera work scheduled at a [`RenderPassEvent`].
///
/// For one camera the queue calls `on_camera_setup` on every pass, then
/// `configure` and `execute` pass by pass, then `on_camera_cleanup` on every
/// pass.
pub trait FramePass {
    fn name(&self) -> &'static str;

    fn event(&self) -> RenderPassEvent;

    fn on_camera_setup(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Binds and prepares targets; runs immediately before `execute`.
    fn configure(&mut self, _ctx: &mut FrameContext<'_>) {}

    fn execute(&mut self, ctx: &mut FrameContext<'_>);

    fn on_camera_cleanup(&mut self, _ctx: &mut FrameContext<'_>) {}
}

/// Passes enqueued for one camera in one frame.
pub struct RenderQueue<'p> {
    passes: Vec<&'p mut dyn FramePass>,
}

impl<'p> RenderQueue<'p> {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn enqueue(&mut self, pass: &'p mut dyn FramePass) {
        self.passes.push(pass);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Pass names in enqueue order.
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs every enqueued pass for the camera in `ctx`, consuming the queue.
    pub fn execute(mut self, ctx: &mut FrameContext<'_>) {
        // Stable, so equal events keep enqueue order.
        self.passes.sort_by_key(|pass| pass.event());

        for pass in self.passes.iter_mut() {
            pass.on_camera_setup(ctx);
        }

        for pass in self.passes.iter_mut() {
            log::trace!("Executing pass {} at {:?}", pass.name(), pass.event());
            pass.configure(ctx);
            pass.execute(ctx);
        }

        for pass in self.passes.iter_mut() {
            pass.on_camera_cleanup(ctx);
        }
    }
}

impl Default for RenderQueue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A pluggable renderer extension contributing passes to each camera.
pub trait RendererFeature {
    fn add_render_passes<'a>(&'a mut self, queue: &mut RenderQueue<'a>);
}

/// Collects the passes of `features` and renders them for one camera.
pub fn render_camera(features: &mut [&mut dyn RendererFeature], ctx: &mut FrameContext<'_>) {
    let mut queue = RenderQueue::new();
    for feature in features.iter_mut() {
        feature.add_render_passes(&mut queue);
    }
    queue.execute(ctx);
}
