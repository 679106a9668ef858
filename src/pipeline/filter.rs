use std::cmp::Ordering;

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::renderer::MeshId;

bitflags! {
    /// Bitmask over the 32 object layers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        const DEFAULT = 1 << 0;
        const TRANSPARENT_FX = 1 << 1;
        const IGNORE_RAYCAST = 1 << 2;
        const WATER = 1 << 4;
        const UI = 1 << 5;
        const EVERYTHING = u32::MAX;
    }
}

impl LayerMask {
    /// Mask with only `index` set; empty for indices past the last layer.
    pub const fn layer(index: u8) -> Self {
        if index < 32 {
            Self::from_bits_retain(1u32 << index)
        } else {
            Self::empty()
        }
    }

    pub fn includes_layer(self, index: u8) -> bool {
        self.intersects(Self::layer(index))
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::EVERYTHING
    }
}

impl Serialize for LayerMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

// Accepts signed values so `-1` selects every layer.
impl<'de> Deserialize<'de> for LayerMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        if raw < i32::MIN as i64 || raw > u32::MAX as i64 {
            return Err(serde::de::Error::custom(format!(
                "layer mask {raw} is outside {}..={}",
                i32::MIN,
                u32::MAX
            )));
        }
        Ok(Self::from_bits_retain(raw as u32))
    }
}

/// Inclusive render-queue interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueRange {
    pub lower: u32,
    pub upper: u32,
}

impl RenderQueueRange {
    pub const OPAQUE: Self = Self {
        lower: 0,
        upper: 2500,
    };
    pub const TRANSPARENT: Self = Self {
        lower: 2501,
        upper: 5000,
    };
    pub const ALL: Self = Self {
        lower: 0,
        upper: 5000,
    };

    pub fn contains(&self, queue: u32) -> bool {
        (self.lower..=self.upper).contains(&queue)
    }
}

/// Which objects a draw may touch: queue range plus layer mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub queue_range: RenderQueueRange,
    pub layer_mask: LayerMask,
}

impl FilterSpec {
    pub fn new(queue_range: RenderQueueRange, layer_mask: LayerMask) -> Self {
        Self {
            queue_range,
            layer_mask,
        }
    }

    pub fn accepts(&self, object: &VisibleObject) -> bool {
        self.queue_range.contains(object.render_queue)
            && self.layer_mask.includes_layer(object.layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortingCriteria {
    /// Queue ascending, then nearest first.
    CommonOpaque,
    /// Queue ascending, then farthest first.
    CommonTransparent,
    /// Queue ascending only.
    QueueOnly,
}

/// Shader pass a draw selects from each object's material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderTag {
    DepthOnly,
    ReflectionOpaque,
    ReflectionTransparent,
}

impl ShaderTag {
    pub fn name(self) -> &'static str {
        match self {
            Self::DepthOnly => "DepthOnly",
            Self::ReflectionOpaque => "HorizontalPlaneReflectionOpaque",
            Self::ReflectionTransparent => "HorizontalPlaneReflectionTransparent",
        }
    }

    pub fn pass_flag(self) -> ShaderPasses {
        match self {
            Self::DepthOnly => ShaderPasses::DEPTH_ONLY,
            Self::ReflectionOpaque => ShaderPasses::REFLECTION_OPAQUE,
            Self::ReflectionTransparent => ShaderPasses::REFLECTION_TRANSPARENT,
        }
    }

    pub fn writes_color(self) -> bool {
        !matches!(self, Self::DepthOnly)
    }

    pub fn blends(self) -> bool {
        matches!(self, Self::ReflectionTransparent)
    }

    pub fn writes_depth(self) -> bool {
        !self.blends()
    }
}

bitflags! {
    /// Shader passes a material provides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderPasses: u8 {
        const DEPTH_ONLY = 1 << 0;
        const REFLECTION_OPAQUE = 1 << 1;
        const REFLECTION_TRANSPARENT = 1 << 2;
        const OPAQUE = Self::DEPTH_ONLY.bits() | Self::REFLECTION_OPAQUE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSettings {
    pub tag: ShaderTag,
    pub sorting: SortingCriteria,
}

impl DrawSettings {
    pub fn new(tag: ShaderTag, sorting: SortingCriteria) -> Self {
        Self { tag, sorting }
    }
}

/// A renderable that survived culling for the current camera.
#[derive(Debug, Clone)]
pub struct VisibleObject {
    pub mesh: MeshId,
    pub model: Mat4,
    pub color: [f32; 4],
    pub layer: u8,
    pub render_queue: u32,
    pub passes: ShaderPasses,
}

impl VisibleObject {
    fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }
}

/// One submitted draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshId,
    pub model: Mat4,
    pub color: [f32; 4],
}

/// The culling system's output for one camera.
#[derive(Debug, Clone, Default)]
pub struct CullingResults {
    visible: Vec<VisibleObject>,
}

impl CullingResults {
    pub fn new(visible: Vec<VisibleObject>) -> Self {
        Self { visible }
    }

    pub fn visible(&self) -> &[VisibleObject] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Filters by `filter` and the draw's shader tag, then sorts per the draw's criteria.
    pub fn select(
        &self,
        filter: &FilterSpec,
        draw: &DrawSettings,
        camera_position: Vec3,
    ) -> Vec<DrawItem> {
        let required = draw.tag.pass_flag();
        let mut selected: Vec<(&VisibleObject, f32)> = self
            .visible
            .iter()
            .filter(|object| filter.accepts(object) && object.passes.contains(required))
            .map(|object| (object, object.position().distance_squared(camera_position)))
            .collect();

        selected.sort_by(|(a, da), (b, db)| {
            let by_queue = a.render_queue.cmp(&b.render_queue);
            let by_distance = match draw.sorting {
                SortingCriteria::CommonOpaque => da.partial_cmp(db).unwrap_or(Ordering::Equal),
                SortingCriteria::CommonTransparent => {
                    db.partial_cmp(da).unwrap_or(Ordering::Equal)
                }
                SortingCriteria::QueueOnly => Ordering::Equal,
            };
            by_queue.then(by_distance)
        });

        selected
            .into_iter()
            .map(|(object, _)| DrawItem {
                mesh: object.mesh,
                model: object.model,
                color: object.color,
            })
            .collect()
    }
}
