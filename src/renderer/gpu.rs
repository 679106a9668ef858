// renderer/gpu.rs (headless device and readback)

use crate::error::{ReflectionError, Result};
use crate::pipeline::ColorFormat;
use crate::renderer::GpuTarget;

/// Device and queue created without a surface.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Reflection Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self { device, queue })
    }

    /// Blocking variant of [`GpuContext::new`].
    pub fn headless() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Copies `target`'s color texture to the CPU as linear RGBA floats.
    ///
    /// Eight-bit formats return their stored (possibly sRGB-encoded) values.
    pub fn read_pixels(&self, target: &GpuTarget) -> Result<Vec<[f32; 4]>> {
        let descriptor = target.descriptor;
        let texel_size: u32 = match descriptor.format {
            ColorFormat::Default | ColorFormat::Srgb => 4,
            ColorFormat::DefaultHdr => 8,
        };
        let row_bytes = descriptor.width * texel_size;
        let bytes_per_row = aligned_bytes_per_row(row_bytes);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (bytes_per_row * descriptor.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(descriptor.height),
                },
            },
            descriptor.extent(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|err| ReflectionError::Readback(err.to_string()))?;
        rx.recv()
            .map_err(|err| ReflectionError::Readback(err.to_string()))?
            .map_err(|err| ReflectionError::Readback(err.to_string()))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(descriptor.pixel_count());
        for row in 0..descriptor.height {
            let start = (row * bytes_per_row) as usize;
            let row_data = &data[start..start + row_bytes as usize];
            for texel in row_data.chunks_exact(texel_size as usize) {
                pixels.push(decode_texel(descriptor.format, texel));
            }
        }
        drop(data);
        buffer.unmap();

        Ok(pixels)
    }
}

fn aligned_bytes_per_row(row_bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row_bytes.div_ceil(align) * align
}

fn decode_texel(format: ColorFormat, texel: &[u8]) -> [f32; 4] {
    match format {
        ColorFormat::Default | ColorFormat::Srgb => {
            [texel[0], texel[1], texel[2], texel[3]].map(|c| c as f32 / 255.0)
        }
        ColorFormat::DefaultHdr => {
            let channel = |i: usize| half::f16::from_le_bytes([texel[2 * i], texel[2 * i + 1]]).to_f32();
            [channel(0), channel(1), channel(2), channel(3)]
        }
    }
}
