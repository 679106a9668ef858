use std::rc::Rc;

use crate::pipeline::{RenderBackend, RenderQueue, RendererFeature};
use crate::reflection::debug::DebugBlitPass;
use crate::reflection::math::MirrorMatrices;
use crate::reflection::pass::{PassShared, ReflectionCategory, ReflectionPass};
use crate::reflection::target::assign_roles;
use crate::settings::ReflectionSettings;

/// Renderer feature producing a mirror image of the scene about a horizontal
/// plane into `_HorizontalPlaneReflectionTexture`.
///
/// Passes are built once from the settings. One camera per frame is assumed;
/// several cameras sharing a feature would share its target slot.
pub struct PlanarReflectionFeature {
    settings: ReflectionSettings,
    shared: Option<Rc<PassShared>>,
    opaque: Option<ReflectionPass>,
    transparent: Option<ReflectionPass>,
    debug: Option<DebugBlitPass>,
}

impl PlanarReflectionFeature {
    pub fn new(settings: ReflectionSettings) -> Self {
        let mut feature = Self {
            settings: settings.validate(),
            shared: None,
            opaque: None,
            transparent: None,
            debug: None,
        };
        feature.create();
        feature
    }

    /// Builds the passes for the current settings.
    pub fn create(&mut self) {
        self.opaque = None;
        self.transparent = None;
        self.debug = None;
        self.shared = None;

        if !self.settings.is_enabled() {
            log::info!("Planar reflection disabled: no categories enabled");
            return;
        }

        let shared = Rc::new(PassShared::new(self.settings.clone()));
        let (opaque_role, transparent_role) =
            assign_roles(self.settings.draw_opaque, self.settings.draw_transparent);

        self.opaque = opaque_role.map(|role| {
            ReflectionPass::new(ReflectionCategory::Opaque, role, Rc::clone(&shared))
        });
        self.transparent = transparent_role.map(|role| {
            ReflectionPass::new(ReflectionCategory::Transparent, role, Rc::clone(&shared))
        });
        if self.settings.debug_view {
            self.debug = Some(DebugBlitPass::new(Rc::clone(&shared)));
        }

        log::info!(
            "Planar reflection built: plane {} thickness {}, opaque {:?}, transparent {:?}, debug {}",
            self.settings.plane_height,
            self.settings.plane_thickness,
            opaque_role,
            transparent_role,
            self.debug.is_some()
        );
        self.shared = Some(shared);
    }

    /// Replaces the settings and rebuilds every pass.
    pub fn apply_settings(&mut self, settings: ReflectionSettings, backend: &mut dyn RenderBackend) {
        self.dispose(backend);
        self.settings = settings.validate();
        self.create();
    }

    /// Changes the fade band published from the next frame on. Passes, matrices
    /// and the target are left as they are.
    pub fn set_fade(&mut self, base_height: f32, range: f32) {
        let mut settings = self.settings.clone();
        settings.fade_base_height = base_height;
        settings.fade_range = range;
        self.settings = settings.validate();
        if let Some(shared) = self.shared.as_ref() {
            shared.set_fade_band(self.settings.fade_base_height, self.settings.fade_range);
        }
        log::debug!(
            "Reflection fade set to base {} range {}",
            self.settings.fade_base_height,
            self.settings.fade_range
        );
    }

    /// Releases a target left allocated by an interrupted frame and drops the passes.
    pub fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(shared) = self.shared.take() {
            if shared.target.is_allocated() {
                log::warn!("Releasing reflection target left over from an unfinished frame");
                shared.target.release(backend);
            }
        }
        self.opaque = None;
        self.transparent = None;
        self.debug = None;
    }

    pub fn settings(&self) -> &ReflectionSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_some()
    }

    pub fn matrices(&self) -> Option<MirrorMatrices> {
        self.shared.as_ref().map(|shared| shared.matrices)
    }

    pub fn opaque_pass(&self) -> Option<&ReflectionPass> {
        self.opaque.as_ref()
    }

    pub fn transparent_pass(&self) -> Option<&ReflectionPass> {
        self.transparent.as_ref()
    }

    pub fn debug_pass(&self) -> Option<&DebugBlitPass> {
        self.debug.as_ref()
    }
}

impl RendererFeature for PlanarReflectionFeature {
    fn add_render_passes<'a>(&'a mut self, queue: &mut RenderQueue<'a>) {
        if self.settings.draw_opaque {
            if let Some(pass) = self.opaque.as_mut() {
                queue.enqueue(pass);
            }
        }
        if self.settings.draw_transparent {
            if let Some(pass) = self.transparent.as_mut() {
                queue.enqueue(pass);
            }
        }
        if self.settings.debug_view {
            if let Some(pass) = self.debug.as_mut() {
                queue.enqueue(pass);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CameraData, CullingResults, FrameContext, FramePass, TargetDescriptor};
    use crate::reflection::target::TargetRole;
    use crate::renderer::{MeshStore, SoftwareBackend};
    use glam::Mat4;

    #[test]
    fn debug_pass_needs_an_enabled_category() {
        let feature = PlanarReflectionFeature::new(ReflectionSettings {
            draw_opaque: false,
            debug_view: true,
            ..Default::default()
        });
        assert!(!feature.is_active());
        assert!(feature.debug_pass().is_none());

        let feature = PlanarReflectionFeature::new(ReflectionSettings {
            debug_view: true,
            ..Default::default()
        });
        assert!(feature.debug_pass().is_some());
        assert_eq!(feature.opaque_pass().map(|p| p.role()), Some(TargetRole::Owner));
    }

    #[test]
    fn passes_share_one_state() {
        let feature = PlanarReflectionFeature::new(ReflectionSettings {
            draw_transparent: true,
            ..Default::default()
        });
        let (Some(opaque), Some(transparent)) = (feature.opaque_pass(), feature.transparent_pass())
        else {
            panic!("both passes should be built");
        };
        assert!(Rc::ptr_eq(opaque.shared(), transparent.shared()));
    }

    #[test]
    fn enqueue_order_is_opaque_transparent_debug() {
        let mut feature = PlanarReflectionFeature::new(ReflectionSettings {
            draw_transparent: true,
            debug_view: true,
            ..Default::default()
        });
        let mut queue = RenderQueue::new();
        feature.add_render_passes(&mut queue);
        assert_eq!(
            queue.names(),
            vec![
                "HorizontalPlaneReflectionOpaquePass",
                "HorizontalPlaneReflectionTransparentPass",
                "HorizontalPlaneReflectionDebugPass",
            ]
        );
    }

    #[test]
    fn rebuild_releases_target_of_an_aborted_frame() {
        let mut feature = PlanarReflectionFeature::new(ReflectionSettings::default());
        let mut backend = SoftwareBackend::new(8, 8);
        let camera = CameraData::new(Mat4::IDENTITY, Mat4::IDENTITY, TargetDescriptor::new(8, 8));
        let culling = CullingResults::default();
        let meshes = MeshStore::new();
        {
            let mut ctx = FrameContext::new(&mut backend, &camera, &culling, &meshes);
            let pass = feature.opaque.as_mut().expect("opaque pass");
            pass.on_camera_setup(&mut ctx);
            pass.configure(&mut ctx);
        }
        assert_eq!(backend.stats().live_handles(), 1);

        feature.apply_settings(
            ReflectionSettings {
                draw_transparent: true,
                ..Default::default()
            },
            &mut backend,
        );
        let stats = backend.stats();
        assert_eq!(stats.live_handles(), 0);
        assert_eq!(stats.live_temporaries(), 0);
        assert!(feature.transparent_pass().is_some());
    }
}
