mod common;

use common::*;
use glam::Vec3;
use planar_reflection::pipeline::RendererFeature;
use planar_reflection::renderer::{GpuContext, WgpuBackend};
use planar_reflection::{render_scene, PlanarReflectionFeature, ReflectionSettings};

fn close(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 0.01)
}

fn backend() -> Option<WgpuBackend> {
    match GpuContext::headless() {
        Ok(context) => Some(WgpuBackend::new(context, camera_target())),
        Err(err) => {
            eprintln!("skipping: {err}");
            None
        }
    }
}

#[test]
#[ignore = "requires a GPU adapter"]
fn gpu_frame_matches_the_software_reflection() {
    let Some(mut gpu) = backend() else {
        return;
    };
    let scene = cube_scene();
    let settings = ReflectionSettings {
        debug_view: true,
        ..Default::default()
    };

    let mut feature = PlanarReflectionFeature::new(settings.clone());
    gpu.fill_camera(BACKGROUND);
    let mut features: [&mut dyn RendererFeature; 1] = [&mut feature];
    render_scene(&scene, &mut gpu, camera_target(), &mut features);
    let pixels = gpu.read_camera().expect("camera readback");

    let (x, y) = screen_pixel(&scene, Vec3::new(0.0, -3.0, 0.0));
    let mirrored = pixels[(y * SIZE + x) as usize];
    assert!(close(mirrored, CUBE_COLOR), "{mirrored:?}");
    let (x, y) = screen_pixel(&scene, Vec3::new(0.0, 3.0, 0.0));
    assert!(close(pixels[(y * SIZE + x) as usize], [0.0; 4]));

    let stats = gpu.stats();
    assert_eq!(stats.live_handles(), 0);
    assert_eq!(stats.live_temporaries(), 0);
}

#[test]
#[ignore = "requires a GPU adapter"]
fn gpu_targets_are_pooled_across_frames() {
    let Some(mut gpu) = backend() else {
        return;
    };
    let scene = cube_scene();
    let mut feature = PlanarReflectionFeature::new(ReflectionSettings {
        draw_transparent: true,
        ..Default::default()
    });
    for _ in 0..3 {
        let mut features: [&mut dyn RendererFeature; 1] = [&mut feature];
        render_scene(&scene, &mut gpu, camera_target(), &mut features);
    }

    let stats = gpu.stats();
    assert_eq!(stats.textures_created, 1);
    assert_eq!(stats.live_handles(), 0);
    assert_eq!(stats.live_temporaries(), 0);
}
