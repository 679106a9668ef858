use std::cell::Cell;
use std::rc::Rc;

use glam::Mat4;

use crate::pipeline::{
    CameraData, DrawSettings, FilterSpec, FrameContext, FramePass, RenderBackend,
    RenderPassEvent, RenderQueueRange, ShaderTag, SortingCriteria,
};
use crate::reflection::fade::FadeParameters;
use crate::reflection::math::{gpu_projection, MirrorMatrices};
use crate::reflection::target::{ReflectionTarget, TargetRole};
use crate::settings::ReflectionSettings;

/// State every pass of one feature build reads: the settings it was built
/// from, the mirror matrices and the shared target slot.
///
/// The fade band lives in a cell so it can change between frames without a
/// rebuild; the matrices are fixed for the lifetime of the build.
#[derive(Debug)]
pub struct PassShared {
    pub settings: ReflectionSettings,
    pub matrices: MirrorMatrices,
    pub target: ReflectionTarget,
    fade: Cell<FadeParameters>,
}

impl PassShared {
    pub fn new(settings: ReflectionSettings) -> Self {
        Self {
            matrices: MirrorMatrices::from_settings(&settings),
            target: ReflectionTarget::new(),
            fade: Cell::new(FadeParameters::from_settings(&settings)),
            settings,
        }
    }

    /// Fade values the next executed pass publishes.
    pub fn fade(&self) -> FadeParameters {
        self.fade.get()
    }

    pub fn set_fade_band(&self, base_height: f32, range: f32) {
        let mut fade = self.fade.get();
        fade.base_height = base_height;
        fade.range = range;
        self.fade.set(fade);
    }
}

/// Camera matrices as they were before a pass mirrored them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturedView {
    pub view: Mat4,
    /// Projection with the render-to-texture flip already applied.
    pub projection: Mat4,
}

pub fn capture_view(camera: &CameraData) -> CapturedView {
    CapturedView {
        view: camera.view,
        projection: gpu_projection(camera.projection, camera.projection_flipped),
    }
}

pub fn compute_mirror_view(captured: &CapturedView, matrices: &MirrorMatrices) -> Mat4 {
    matrices.mirrored_view(captured.view)
}

/// Installs the mirrored view and swaps the front-face winding, since the
/// mirror flips the handedness of every triangle.
pub fn apply_mirror_state(
    backend: &mut dyn RenderBackend,
    captured: &CapturedView,
    matrices: &MirrorMatrices,
) {
    backend.set_view_projection(compute_mirror_view(captured, matrices), captured.projection);
    backend.set_invert_culling(true);
}

pub fn restore_state(backend: &mut dyn RenderBackend, captured: &CapturedView) {
    backend.set_invert_culling(false);
    backend.set_view_projection(captured.view, captured.projection);
    backend.flush();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectionCategory {
    Opaque,
    Transparent,
}

impl ReflectionCategory {
    pub fn queue_range(self) -> RenderQueueRange {
        match self {
            Self::Opaque => RenderQueueRange::OPAQUE,
            Self::Transparent => RenderQueueRange::TRANSPARENT,
        }
    }

    pub fn pass_name(self) -> &'static str {
        match self {
            Self::Opaque => "HorizontalPlaneReflectionOpaquePass",
            Self::Transparent => "HorizontalPlaneReflectionTransparentPass",
        }
    }
}

/// Renders one object category into the reflection target from the
/// mirrored camera.
pub struct ReflectionPass {
    category: ReflectionCategory,
    role: TargetRole,
    filter: FilterSpec,
    event: RenderPassEvent,
    shared: Rc<PassShared>,
}

impl ReflectionPass {
    pub fn new(category: ReflectionCategory, role: TargetRole, shared: Rc<PassShared>) -> Self {
        Self {
            category,
            role,
            filter: FilterSpec::new(category.queue_range(), shared.settings.culling_mask),
            event: shared.settings.render_pass_event,
            shared,
        }
    }

    pub fn category(&self) -> ReflectionCategory {
        self.category
    }

    pub fn role(&self) -> TargetRole {
        self.role
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn shared(&self) -> &Rc<PassShared> {
        &self.shared
    }
}

impl FramePass for ReflectionPass {
    fn name(&self) -> &'static str {
        self.category.pass_name()
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn on_camera_setup(&mut self, ctx: &mut FrameContext<'_>) {
        if self.role.initializes() {
            self.shared.target.initialize(ctx.backend);
        }
    }

    fn configure(&mut self, ctx: &mut FrameContext<'_>) {
        self.shared.target.configure(
            ctx.backend,
            &ctx.camera.descriptor,
            &self.shared.settings,
            self.role,
        );
    }

    fn execute(&mut self, ctx: &mut FrameContext<'_>) {
        let captured = capture_view(ctx.camera);
        apply_mirror_state(ctx.backend, &captured, &self.shared.matrices);
        self.shared.fade().publish(ctx.backend);

        let drawn = match self.category {
            ReflectionCategory::Opaque => {
                let sorting = ctx.camera.opaque_sorting;
                ctx.draw_renderers(&DrawSettings::new(ShaderTag::DepthOnly, sorting), &self.filter);
                ctx.draw_renderers(
                    &DrawSettings::new(ShaderTag::ReflectionOpaque, sorting),
                    &self.filter,
                )
            }
            ReflectionCategory::Transparent => ctx.draw_renderers(
                &DrawSettings::new(
                    ShaderTag::ReflectionTransparent,
                    SortingCriteria::CommonTransparent,
                ),
                &self.filter,
            ),
        };
        log::debug!("{} drew {} objects", self.name(), drawn);

        restore_state(ctx.backend, &captured);
    }

    fn on_camera_cleanup(&mut self, ctx: &mut FrameContext<'_>) {
        if self.role.releases() {
            self.shared.target.release(ctx.backend);
        }
    }
}
