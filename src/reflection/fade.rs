use crate::pipeline::{PropertyId, RenderBackend};
use crate::reflection::math::PLANE_HEIGHT_EPSILON;
use crate::settings::ReflectionSettings;

pub const FADE_RANGE_ID: PropertyId = PropertyId::from_name("_ReflectionFadeRange");
pub const FADE_BASE_HEIGHT_ID: PropertyId = PropertyId::from_name("_ReflectionFadeBaseHeight");
pub const PLANE_HEIGHT_ID: PropertyId = PropertyId::from_name("_ReflectionPlaneHeight");

/// Shader globals describing the fade band a floor shader blends the
/// reflection with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeParameters {
    pub range: f32,
    pub base_height: f32,
    /// Plane height minus [`PLANE_HEIGHT_EPSILON`].
    pub plane_height: f32,
}

impl FadeParameters {
    pub fn from_settings(settings: &ReflectionSettings) -> Self {
        Self {
            range: settings.fade_range,
            base_height: settings.fade_base_height,
            plane_height: settings.plane_height - PLANE_HEIGHT_EPSILON,
        }
    }

    /// Writes the three globals. Called every frame since the fade band may
    /// change without a rebuild.
    pub fn publish(&self, backend: &mut dyn RenderBackend) {
        backend.set_global_float(FADE_RANGE_ID, self.range);
        backend.set_global_float(FADE_BASE_HEIGHT_ID, self.base_height);
        backend.set_global_float(PLANE_HEIGHT_ID, self.plane_height);
    }

    /// Reads the globals back, if all three have been published.
    pub fn from_backend(backend: &dyn RenderBackend) -> Option<Self> {
        Some(Self {
            range: backend.global_float(FADE_RANGE_ID)?,
            base_height: backend.global_float(FADE_BASE_HEIGHT_ID)?,
            plane_height: backend.global_float(PLANE_HEIGHT_ID)?,
        })
    }

    /// Reflection visibility at `world_y`: 1 up to the base height, falling
    /// linearly to 0 over the fade range.
    pub fn weight(&self, world_y: f32) -> f32 {
        let above = world_y - self.base_height;
        if self.range <= 0.0 {
            return if above <= 0.0 { 1.0 } else { 0.0 };
        }
        (1.0 - above / self.range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade(base_height: f32, range: f32) -> FadeParameters {
        FadeParameters {
            range,
            base_height,
            plane_height: -PLANE_HEIGHT_EPSILON,
        }
    }

    #[test]
    fn weight_falls_off_across_the_band() {
        let f = fade(2.0, 1.0);
        assert_eq!(f.weight(0.0), 1.0);
        assert_eq!(f.weight(2.0), 1.0);
        assert_eq!(f.weight(2.5), 0.5);
        assert_eq!(f.weight(3.0), 0.0);
        assert_eq!(f.weight(10.0), 0.0);
    }

    #[test]
    fn zero_range_is_a_hard_cut() {
        let f = fade(1.0, 0.0);
        assert_eq!(f.weight(1.0), 1.0);
        assert_eq!(f.weight(1.001), 0.0);
    }

    #[test]
    fn plane_height_is_offset_by_epsilon() {
        let settings = ReflectionSettings {
            plane_height: 1.0,
            ..Default::default()
        };
        let f = FadeParameters::from_settings(&settings);
        assert!((f.plane_height - (1.0 - PLANE_HEIGHT_EPSILON)).abs() < 1e-6);
    }
}
