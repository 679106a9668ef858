use serde::{Deserialize, Serialize};

/// Named insertion points in a camera's frame.
///
/// Passes are executed in ascending [`RenderPassEvent::order`]; passes sharing
/// an event keep the order they were enqueued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPassEvent {
    BeforeRendering,
    BeforeRenderingShadows,
    AfterRenderingShadows,
    BeforeRenderingPrePasses,
    AfterRenderingPrePasses,
    BeforeRenderingOpaques,
    AfterRenderingOpaques,
    BeforeRenderingSkybox,
    AfterRenderingSkybox,
    BeforeRenderingTransparents,
    AfterRenderingTransparents,
    BeforeRenderingPostProcessing,
    AfterRenderingPostProcessing,
    AfterRendering,
}

impl RenderPassEvent {
    pub const fn order(self) -> u32 {
        match self {
            Self::BeforeRendering => 0,
            Self::BeforeRenderingShadows => 50,
            Self::AfterRenderingShadows => 100,
            Self::BeforeRenderingPrePasses => 150,
            Self::AfterRenderingPrePasses => 200,
            Self::BeforeRenderingOpaques => 250,
            Self::AfterRenderingOpaques => 300,
            Self::BeforeRenderingSkybox => 350,
            Self::AfterRenderingSkybox => 400,
            Self::BeforeRenderingTransparents => 450,
            Self::AfterRenderingTransparents => 500,
            Self::BeforeRenderingPostProcessing => 550,
            Self::AfterRenderingPostProcessing => 600,
            Self::AfterRendering => 1000,
        }
    }
}

impl Default for RenderPassEvent {
    fn default() -> Self {
        Self::BeforeRenderingOpaques
    }
}

impl PartialOrd for RenderPassEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RenderPassEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order().cmp(&other.order())
    }
}
