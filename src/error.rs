use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::PropertyId;

/// Failures of the ambient operations around the reflection feature.
///
/// The per-frame pass path never returns these; they come from loading
/// settings, creating a GPU device, reading pixels back and exporting images.
#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("failed to read settings file {path:?}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse reflection settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("no compatible GPU adapter: {0}")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("render target {0:?} is not allocated")]
    MissingTarget(PropertyId),

    #[error("failed to export image: {0}")]
    ImageExport(#[from] image::ImageError),
}

pub type Result<T, E = ReflectionError> = std::result::Result<T, E>;
