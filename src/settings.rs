use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ReflectionError, Result};
use crate::pipeline::{ColorFormat, LayerMask, RenderPassEvent, TextureFilter};

/// Configuration of one planar reflection feature.
///
/// Read once when the feature is built; changing the target scale or format
/// takes a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionSettings {
    /// Layers whose objects appear in the reflection.
    pub culling_mask: LayerMask,
    /// World Y of the mirror plane.
    pub plane_height: f32,
    /// Extra vertical offset folded into the mirror translation.
    pub plane_thickness: f32,
    pub fade_base_height: f32,
    pub fade_range: f32,
    pub draw_opaque: bool,
    pub draw_transparent: bool,
    pub render_pass_event: RenderPassEvent,
    /// Multiplier on the camera resolution, in `0.01..=2.0`.
    pub resolution_scale: f32,
    pub texture_format: ColorFormat,
    pub filter_mode: TextureFilter,
    /// Copies the reflection target onto the camera after rendering.
    pub debug_view: bool,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            culling_mask: LayerMask::EVERYTHING,
            plane_height: 0.0,
            plane_thickness: 0.0,
            fade_base_height: 0.0,
            fade_range: Self::default_fade_range(),
            draw_opaque: true,
            draw_transparent: false,
            render_pass_event: RenderPassEvent::BeforeRenderingOpaques,
            resolution_scale: Self::default_resolution_scale(),
            texture_format: ColorFormat::Default,
            filter_mode: TextureFilter::Point,
            debug_view: false,
        }
    }
}

impl ReflectionSettings {
    pub const MIN_RESOLUTION_SCALE: f32 = 0.01;
    pub const MAX_RESOLUTION_SCALE: f32 = 2.0;
    pub const DEFAULT_PATH: &'static str = "reflection.json";

    pub fn load() -> Self {
        Self::load_from_path(Self::DEFAULT_PATH)
    }

    /// Loads and validates settings, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(settings) => {
                info!("Loaded reflection settings from {:?}", path);
                settings
            }
            Err(ReflectionError::SettingsRead { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                info!(
                    "Reflection settings file {:?} not found. Using default settings.",
                    path
                );
                Self::default()
            }
            Err(err) => {
                warn!("{}. Falling back to default reflection settings.", err);
                Self::default()
            }
        }
    }

    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ReflectionError::SettingsRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        Ok(settings.validate())
    }

    /// Clamps out-of-range values, warning about each one.
    pub fn validate(mut self) -> Self {
        if !self.resolution_scale.is_finite() {
            warn!("Resolution scale is not finite. Using 1.0 instead.");
            self.resolution_scale = Self::default_resolution_scale();
        }
        let clamped = self
            .resolution_scale
            .clamp(Self::MIN_RESOLUTION_SCALE, Self::MAX_RESOLUTION_SCALE);
        if clamped != self.resolution_scale {
            warn!(
                "Resolution scale {} is outside {}..={}. Using {}.",
                self.resolution_scale,
                Self::MIN_RESOLUTION_SCALE,
                Self::MAX_RESOLUTION_SCALE,
                clamped
            );
            self.resolution_scale = clamped;
        }

        if self.plane_thickness < 0.0 {
            warn!("Plane thickness must not be negative. Using 0.");
            self.plane_thickness = 0.0;
        }
        if self.fade_base_height < 0.0 {
            warn!("Fade base height must not be negative. Using 0.");
            self.fade_base_height = 0.0;
        }
        if self.fade_range < 0.0 {
            warn!("Fade range must not be negative. Using 0.");
            self.fade_range = 0.0;
        }

        self
    }

    /// Whether the settings produce any reflection passes.
    pub fn is_enabled(&self) -> bool {
        self.draw_opaque || self.draw_transparent
    }

    const fn default_fade_range() -> f32 {
        1.0
    }

    const fn default_resolution_scale() -> f32 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> ReflectionSettings {
        ReflectionSettings {
            plane_thickness: -1.0,
            fade_base_height: -2.0,
            fade_range: -0.5,
            resolution_scale: 5.0,
            ..ReflectionSettings::default()
        }
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let validated = invalid_settings().validate();

        assert_eq!(validated.plane_thickness, 0.0);
        assert_eq!(validated.fade_base_height, 0.0);
        assert_eq!(validated.fade_range, 0.0);
        assert_eq!(
            validated.resolution_scale,
            ReflectionSettings::MAX_RESOLUTION_SCALE
        );

        let tiny = ReflectionSettings {
            resolution_scale: 0.0,
            ..ReflectionSettings::default()
        }
        .validate();
        assert_eq!(tiny.resolution_scale, ReflectionSettings::MIN_RESOLUTION_SCALE);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = ReflectionSettings {
            plane_height: -3.0,
            plane_thickness: 0.25,
            fade_base_height: 2.0,
            fade_range: 1.5,
            resolution_scale: 0.5,
            ..ReflectionSettings::default()
        };
        assert_eq!(valid.clone().validate(), valid);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings = ReflectionSettings::from_json(
            r#"{ "culling_mask": -1, "draw_transparent": true, "texture_format": "default_hdr",
                 "render_pass_event": "after_rendering_skybox" }"#,
        )
        .unwrap();

        assert_eq!(settings.culling_mask, LayerMask::EVERYTHING);
        assert!(settings.draw_opaque);
        assert!(settings.draw_transparent);
        assert_eq!(settings.texture_format, ColorFormat::DefaultHdr);
        assert_eq!(settings.render_pass_event, RenderPassEvent::AfterRenderingSkybox);
        assert_eq!(settings.fade_range, 1.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = ReflectionSettings::from_json("{ \"fade_range\": \"far\" }").unwrap_err();
        assert!(matches!(err, ReflectionError::SettingsParse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = ReflectionSettings::load_from_path("does/not/exist/reflection.json");
        assert_eq!(settings, ReflectionSettings::default());
    }
}
