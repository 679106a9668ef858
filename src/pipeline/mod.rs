//! Contracts between the reflection feature and the host renderer.
//!
//! The host owns pass scheduling, culling and draw submission. This module
//! names the pieces the reflection passes rely on: the [`RenderBackend`]
//! command surface, the per-camera [`FrameContext`], the [`RenderQueue`] that
//! orders passes by [`RenderPassEvent`], and the filtering/sorting types used
//! to select draw lists.

mod backend;
mod camera;
mod event;
mod filter;
mod queue;

pub use backend::{
    BackendStats, ClearColor, ColorFormat, PropertyId, RenderBackend, TargetDescriptor,
    TargetHandle, TextureFilter,
};
pub use camera::CameraData;
pub use event::RenderPassEvent;
pub use filter::{
    CullingResults, DrawItem, DrawSettings, FilterSpec, LayerMask, RenderQueueRange,
    ShaderPasses, ShaderTag, SortingCriteria, VisibleObject,
};
pub use queue::{render_camera, FramePass, FrameContext, RenderQueue, RendererFeature};
