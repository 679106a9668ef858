use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::pipeline::filter::{DrawItem, ShaderTag};
use crate::renderer::MeshStore;

/// Stable key for a name-addressed shader global or render target.
///
/// Derived from the name with FNV-1a so the same name always yields the same
/// id, in every process and for every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        Self(hash)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to an allocated render target binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub(crate) u32);

/// Pixel format of an offscreen color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFormat {
    /// 8-bit linear RGBA.
    Default,
    /// 8-bit RGBA with sRGB encoding.
    Srgb,
    /// 16-bit float RGBA.
    DefaultHdr,
}

impl ColorFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::Default => wgpu::TextureFormat::Rgba8Unorm,
            Self::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            Self::DefaultHdr => wgpu::TextureFormat::Rgba16Float,
        }
    }

    /// Whether stored values are clamped to `[0, 1]`.
    pub fn is_ldr(self) -> bool {
        !matches!(self, Self::DefaultHdr)
    }
}

impl Default for ColorFormat {
    fn default() -> Self {
        Self::Default
    }
}

/// Sampling filter applied when the target is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Point,
    Bilinear,
    Trilinear,
}

impl TextureFilter {
    pub fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            Self::Point => wgpu::FilterMode::Nearest,
            Self::Bilinear | Self::Trilinear => wgpu::FilterMode::Linear,
        }
    }

    pub fn mipmap_filter(self) -> wgpu::FilterMode {
        match self {
            Self::Trilinear => wgpu::FilterMode::Linear,
            Self::Point | Self::Bilinear => wgpu::FilterMode::Nearest,
        }
    }
}

impl Default for TextureFilter {
    fn default() -> Self {
        Self::Point
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    pub filter: TextureFilter,
}

impl TargetDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format: ColorFormat::default(),
            filter: TextureFilter::default(),
        }
    }

    /// Multiplies both sides by `scale`, truncating and keeping at least one pixel.
    pub fn scaled(mut self, scale: f32) -> Self {
        self.width = ((self.width as f32 * scale) as u32).max(1);
        self.height = ((self.height as f32 * scale) as u32).max(1);
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Allocation counters kept by a backend, used to detect leaked targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub handles_allocated: u32,
    pub handles_released: u32,
    pub temporaries_requested: u32,
    pub temporaries_released: u32,
    /// Storage actually created; pooled reuse does not count.
    pub textures_created: u32,
}

impl BackendStats {
    pub fn live_handles(&self) -> u32 {
        self.handles_allocated.saturating_sub(self.handles_released)
    }

    pub fn live_temporaries(&self) -> u32 {
        self.temporaries_requested
            .saturating_sub(self.temporaries_released)
    }
}

/// Command surface of the host renderer that passes record into.
///
/// Calls are issued synchronously from a single thread while a camera is being
/// rendered. `flush` marks the point where recorded work becomes visible to the
/// next pass.
pub trait RenderBackend {
    /// Binds a handle to a name-addressed target slot.
    fn alloc_target_handle(&mut self, id: PropertyId) -> TargetHandle;

    fn release_target_handle(&mut self, handle: TargetHandle);

    /// Provides a scratch color/depth buffer under `id` for the rest of the frame.
    fn get_temporary_target(&mut self, id: PropertyId, descriptor: &TargetDescriptor);

    fn release_temporary_target(&mut self, id: PropertyId);

    /// Routes subsequent draws to `id`, clearing color and depth when `clear` is set.
    fn set_render_target(&mut self, id: PropertyId, clear: Option<ClearColor>);

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);

    /// Swaps the front-face winding used for back-face culling.
    fn set_invert_culling(&mut self, invert: bool);

    fn set_global_float(&mut self, id: PropertyId, value: f32);

    fn global_float(&self, id: PropertyId) -> Option<f32>;

    /// Draws `items` with the shader pass named by `tag` into the bound target.
    fn draw(&mut self, meshes: &MeshStore, items: &[DrawItem], tag: ShaderTag);

    /// Copies `source` onto the camera's color target.
    fn blit_to_camera(&mut self, source: PropertyId);

    fn has_temporary_target(&self, id: PropertyId) -> bool;

    fn flush(&mut self);
}
