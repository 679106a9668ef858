mod common;

use common::*;
use glam::Vec3;
use planar_reflection::pipeline::{RenderBackend, RenderQueue, RendererFeature, ShaderTag};
use planar_reflection::reflection::{
    assign_roles, roles_are_balanced, TargetRole, PLANE_HEIGHT_ID, REFLECTION_TEXTURE_ID,
};
use planar_reflection::renderer::{BackendEvent, SoftwareBackend};
use planar_reflection::scene::Material;
use planar_reflection::{PlanarReflectionFeature, ReflectionSettings};

fn settings(draw_opaque: bool, draw_transparent: bool) -> ReflectionSettings {
    ReflectionSettings {
        draw_opaque,
        draw_transparent,
        ..Default::default()
    }
}

fn mixed_scene() -> planar_reflection::scene::Scene {
    scene_with(&[
        (Vec3::new(-1.0, 2.0, 0.0), Material::opaque(CUBE_COLOR)),
        (Vec3::new(1.0, 2.0, 0.0), Material::transparent([0.0, 0.0, 1.0, 0.5])),
    ])
}

#[test]
fn opaque_only_pass_owns_the_target() {
    let feature = PlanarReflectionFeature::new(settings(true, false));
    let opaque = feature.opaque_pass().expect("opaque pass");
    assert_eq!(opaque.role(), TargetRole::Owner);
    assert!(opaque.role().initializes() && opaque.role().releases());
    assert!(feature.transparent_pass().is_none());
}

#[test]
fn transparent_only_pass_owns_the_target() {
    let feature = PlanarReflectionFeature::new(settings(false, true));
    assert!(feature.opaque_pass().is_none());
    let transparent = feature.transparent_pass().expect("transparent pass");
    assert_eq!(transparent.role(), TargetRole::Owner);
}

#[test]
fn both_categories_split_initialize_and_release() {
    let feature = PlanarReflectionFeature::new(settings(true, true));
    let opaque = feature.opaque_pass().expect("opaque pass").role();
    let transparent = feature.transparent_pass().expect("transparent pass").role();

    assert!(opaque.initializes() && !opaque.releases());
    assert!(!transparent.initializes() && transparent.releases());
    assert!(roles_are_balanced(&[opaque, transparent]));
}

#[test]
fn every_combination_is_balanced() {
    for (opaque, transparent) in [(true, true), (true, false), (false, true)] {
        let (a, b) = assign_roles(opaque, transparent);
        let roles: Vec<TargetRole> = a.into_iter().chain(b).collect();
        assert!(roles_are_balanced(&roles), "{opaque} {transparent}");
    }
    assert_eq!(assign_roles(false, false), (None, None));
}

#[test]
fn disabled_feature_builds_nothing_and_never_allocates() {
    let mut feature = PlanarReflectionFeature::new(ReflectionSettings {
        draw_opaque: false,
        draw_transparent: false,
        debug_view: true,
        ..Default::default()
    });
    assert!(!feature.is_active());
    assert!(feature.matrices().is_none());

    let mut queue = RenderQueue::new();
    feature.add_render_passes(&mut queue);
    assert!(queue.is_empty());
    drop(queue);

    let scene = cube_scene();
    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    render_frame(&scene, &mut backend, &mut feature);
    assert_eq!(backend.stats(), Default::default());
    assert!(backend.events().is_empty());
}

#[test]
fn opaque_pass_records_the_mirror_sequence() {
    let scene = cube_scene();
    let mut feature = PlanarReflectionFeature::new(settings(true, false));
    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    render_frame(&scene, &mut backend, &mut feature);

    let camera = scene.camera_data(camera_target());
    let mirrored = feature
        .matrices()
        .expect("active feature")
        .mirrored_view(camera.view);

    let events = backend.events();
    assert_eq!(events.len(), 15, "{events:#?}");
    assert!(matches!(events[0], BackendEvent::AllocHandle(id) if id == REFLECTION_TEXTURE_ID));
    assert!(matches!(events[1], BackendEvent::GetTemporary(id, desc)
        if id == REFLECTION_TEXTURE_ID && desc.width == SIZE && desc.height == SIZE));
    assert_eq!(
        events[2],
        BackendEvent::SetRenderTarget {
            id: REFLECTION_TEXTURE_ID,
            clear: true
        }
    );
    assert_eq!(
        events[3],
        BackendEvent::SetViewProjection {
            view: mirrored,
            projection: camera.projection
        }
    );
    assert_eq!(events[4], BackendEvent::SetInvertCulling(true));
    assert!(matches!(events[5..8], [
        BackendEvent::SetGlobal(..),
        BackendEvent::SetGlobal(..),
        BackendEvent::SetGlobal(id, _),
    ] if id == PLANE_HEIGHT_ID));
    assert_eq!(
        events[8],
        BackendEvent::Draw {
            tag: ShaderTag::DepthOnly,
            count: 1
        }
    );
    assert_eq!(
        events[9],
        BackendEvent::Draw {
            tag: ShaderTag::ReflectionOpaque,
            count: 1
        }
    );
    assert_eq!(events[10], BackendEvent::SetInvertCulling(false));
    assert_eq!(
        events[11],
        BackendEvent::SetViewProjection {
            view: camera.view,
            projection: camera.projection
        }
    );
    assert_eq!(events[12], BackendEvent::Flush);
    assert_eq!(events[13], BackendEvent::ReleaseTemporary(REFLECTION_TEXTURE_ID));
    assert!(matches!(events[14], BackendEvent::ReleaseHandle(id) if id == REFLECTION_TEXTURE_ID));
    assert!(!backend.is_culling_inverted());
}

#[test]
fn two_passes_share_one_target_per_frame() {
    let scene = mixed_scene();
    let mut feature = PlanarReflectionFeature::new(settings(true, true));
    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    render_frame(&scene, &mut backend, &mut feature);

    let events = backend.events();
    let count = |pred: &dyn Fn(&BackendEvent) -> bool| events.iter().filter(|e| pred(e)).count();
    assert_eq!(count(&|e| matches!(e, BackendEvent::AllocHandle(_))), 1);
    assert_eq!(count(&|e| matches!(e, BackendEvent::ReleaseHandle(_))), 1);
    assert_eq!(count(&|e| matches!(e, BackendEvent::GetTemporary(..))), 1);
    assert_eq!(
        count(&|e| matches!(e, BackendEvent::SetRenderTarget { clear: true, .. })),
        1
    );
    assert_eq!(
        count(&|e| matches!(e, BackendEvent::SetRenderTarget { clear: false, .. })),
        1
    );
    assert_eq!(
        count(&|e| matches!(
            e,
            BackendEvent::Draw {
                tag: ShaderTag::ReflectionTransparent,
                count: 1
            }
        )),
        1
    );

    // The transparent pass draws after the opaque pass and before the release.
    let position = |target: BackendEvent| events.iter().position(|e| *e == target);
    let opaque = position(BackendEvent::Draw {
        tag: ShaderTag::ReflectionOpaque,
        count: 1,
    });
    let transparent = position(BackendEvent::Draw {
        tag: ShaderTag::ReflectionTransparent,
        count: 1,
    });
    let release = position(BackendEvent::ReleaseTemporary(REFLECTION_TEXTURE_ID));
    assert!(opaque < transparent && transparent < release);

    let stats = backend.stats();
    assert_eq!(stats.live_handles(), 0);
    assert_eq!(stats.live_temporaries(), 0);
}

#[test]
fn rebuilds_do_not_leak_targets() {
    let scene = mixed_scene();
    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    let mut feature = PlanarReflectionFeature::new(settings(true, false));

    let cycle = [(true, false), (false, true), (true, true), (false, false), (true, false)];
    for _ in 0..4 {
        for (opaque, transparent) in cycle {
            feature.apply_settings(settings(opaque, transparent), &mut backend);
            for _ in 0..3 {
                render_frame(&scene, &mut backend, &mut feature);
            }
            let stats = backend.stats();
            assert_eq!(stats.live_handles(), 0);
            assert_eq!(stats.live_temporaries(), 0);
            assert!(!backend.has_temporary_target(REFLECTION_TEXTURE_ID));
        }
    }
    // Same descriptor every frame, so pooled storage is reused.
    assert_eq!(backend.stats().textures_created, 1);
}

#[test]
fn debug_pass_runs_after_the_reflection_passes() {
    let mut feature = PlanarReflectionFeature::new(ReflectionSettings {
        draw_transparent: true,
        debug_view: true,
        ..Default::default()
    });
    let scene = mixed_scene();
    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    render_frame(&scene, &mut backend, &mut feature);

    let events = backend.events();
    let blit = events
        .iter()
        .position(|e| *e == BackendEvent::Blit(REFLECTION_TEXTURE_ID))
        .expect("debug blit");
    let last_draw = events
        .iter()
        .rposition(|e| matches!(e, BackendEvent::Draw { .. }))
        .expect("draws");
    let release = events
        .iter()
        .position(|e| *e == BackendEvent::ReleaseTemporary(REFLECTION_TEXTURE_ID))
        .expect("release");
    assert!(last_draw < blit && blit < release);
}
