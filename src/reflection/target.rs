use std::cell::Cell;

use crate::pipeline::{ClearColor, PropertyId, RenderBackend, TargetDescriptor, TargetHandle};
use crate::settings::ReflectionSettings;

/// Name surface shaders sample the reflection under.
pub const REFLECTION_TEXTURE_NAME: &str = "_HorizontalPlaneReflectionTexture";
pub const REFLECTION_TEXTURE_ID: PropertyId = PropertyId::from_name(REFLECTION_TEXTURE_NAME);

/// Which part of the reflection target's lifecycle a pass owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRole {
    /// Sole active pass: allocates and releases.
    Owner,
    /// First of two passes: allocates and clears.
    Initializer,
    /// Last of two passes: releases.
    Finalizer,
}

impl TargetRole {
    pub fn initializes(self) -> bool {
        matches!(self, Self::Owner | Self::Initializer)
    }

    pub fn releases(self) -> bool {
        matches!(self, Self::Owner | Self::Finalizer)
    }
}

/// Roles for the opaque and transparent passes, `None` where the pass is not built.
pub fn assign_roles(
    draw_opaque: bool,
    draw_transparent: bool,
) -> (Option<TargetRole>, Option<TargetRole>) {
    match (draw_opaque, draw_transparent) {
        (true, true) => (Some(TargetRole::Initializer), Some(TargetRole::Finalizer)),
        (true, false) => (Some(TargetRole::Owner), None),
        (false, true) => (None, Some(TargetRole::Owner)),
        (false, false) => (None, None),
    }
}

/// True when exactly one role initializes and exactly one releases.
pub fn roles_are_balanced(roles: &[TargetRole]) -> bool {
    let initializers = roles.iter().filter(|role| role.initializes()).count();
    let finalizers = roles.iter().filter(|role| role.releases()).count();
    initializers == 1 && finalizers == 1
}

/// The handle slot for the shared reflection target of one feature.
#[derive(Debug, Default)]
pub struct ReflectionTarget {
    handle: Cell<Option<TargetHandle>>,
}

impl ReflectionTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_allocated(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn handle(&self) -> Option<TargetHandle> {
        self.handle.get()
    }

    /// Descriptor the initializing pass requests: camera size times the
    /// resolution scale, in the configured format and filter.
    pub fn descriptor_for(camera: &TargetDescriptor, settings: &ReflectionSettings) -> TargetDescriptor {
        let mut descriptor = camera.scaled(settings.resolution_scale);
        descriptor.format = settings.texture_format;
        descriptor.filter = settings.filter_mode;
        descriptor
    }

    pub fn initialize(&self, backend: &mut dyn RenderBackend) {
        if let Some(stale) = self.handle.take() {
            log::warn!("Reflection target initialized twice; releasing stale handle");
            backend.release_target_handle(stale);
        }
        let handle = backend.alloc_target_handle(REFLECTION_TEXTURE_ID);
        self.handle.set(Some(handle));
    }

    /// Binds the target for drawing. The initializing pass also (re)creates the
    /// scratch buffer and clears it; other passes draw over its contents.
    pub fn configure(
        &self,
        backend: &mut dyn RenderBackend,
        camera: &TargetDescriptor,
        settings: &ReflectionSettings,
        role: TargetRole,
    ) {
        if role.initializes() {
            let descriptor = Self::descriptor_for(camera, settings);
            backend.get_temporary_target(REFLECTION_TEXTURE_ID, &descriptor);
            backend.set_render_target(REFLECTION_TEXTURE_ID, Some(ClearColor::TRANSPARENT));
        } else {
            backend.set_render_target(REFLECTION_TEXTURE_ID, None);
        }
    }

    pub fn release(&self, backend: &mut dyn RenderBackend) {
        if backend.has_temporary_target(REFLECTION_TEXTURE_ID) {
            backend.release_temporary_target(REFLECTION_TEXTURE_ID);
        }
        if let Some(handle) = self.handle.take() {
            backend.release_target_handle(handle);
        }
    }
}
