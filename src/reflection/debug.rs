use std::rc::Rc;

use crate::pipeline::{FrameContext, FramePass, RenderPassEvent};
use crate::reflection::pass::PassShared;
use crate::reflection::target::REFLECTION_TEXTURE_ID;

/// Copies the reflection target over the camera image for inspection.
pub struct DebugBlitPass {
    shared: Rc<PassShared>,
}

impl DebugBlitPass {
    pub fn new(shared: Rc<PassShared>) -> Self {
        Self { shared }
    }
}

impl FramePass for DebugBlitPass {
    fn name(&self) -> &'static str {
        "HorizontalPlaneReflectionDebugPass"
    }

    fn event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    fn execute(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.shared.target.is_allocated() || !ctx.backend.has_temporary_target(REFLECTION_TEXTURE_ID)
        {
            return;
        }
        ctx.backend.blit_to_camera(REFLECTION_TEXTURE_ID);
        ctx.backend.flush();
    }
}
