use std::path::PathBuf;

use clap::Parser;
use planar_reflection::pipeline::{ClearColor, RendererFeature, TargetDescriptor};
use planar_reflection::renderer::{rgba_image, GpuContext, SoftwareBackend, WgpuBackend};
use planar_reflection::scene::{demo_settings, reflection_demo_scene};
use planar_reflection::{
    init_logging, render_scene, PlanarReflectionFeature, ReflectionSettings, Result,
};

const BACKGROUND: ClearColor = ClearColor {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

/// Renders the reflection of the demo scene and saves it as a PNG.
#[derive(Debug, Parser)]
#[command(name = "planar-reflection")]
struct Cli {
    /// Reflection settings JSON; defaults apply when the file is missing.
    #[arg(long, default_value = ReflectionSettings::DEFAULT_PATH)]
    settings: PathBuf,

    #[arg(long, short, default_value = "reflection.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Render with wgpu instead of the CPU rasterizer.
    #[arg(long)]
    gpu: bool,
}

fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = demo_settings(ReflectionSettings::load_from_path(&cli.settings));

    let scene = reflection_demo_scene();
    let mut feature = PlanarReflectionFeature::new(settings);
    let camera_target = TargetDescriptor::new(cli.width, cli.height);
    let mut features: [&mut dyn RendererFeature; 1] = [&mut feature];

    let image = if cli.gpu {
        let context = GpuContext::headless()?;
        let mut backend = WgpuBackend::new(context, camera_target);
        backend.fill_camera(BACKGROUND);
        render_scene(&scene, &mut backend, camera_target, &mut features);
        let pixels = backend.read_camera()?;
        log::info!("GPU backend stats: {:?}", backend.stats());
        rgba_image(camera_target.width, camera_target.height, &pixels)
    } else {
        let mut backend = SoftwareBackend::with_camera_descriptor(camera_target);
        backend.fill_camera(BACKGROUND);
        render_scene(&scene, &mut backend, camera_target, &mut features);
        log::info!("Software backend stats: {:?}", backend.stats());
        backend.camera_image()
    };

    image.save(&cli.output)?;
    log::info!("Wrote {:?}", cli.output);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
