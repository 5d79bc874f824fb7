use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop the renderer from starting or from reading data back.
///
/// Creation failures are fatal: there is no degraded mode, the caller is expected
/// to abort start-up.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface reports no supported formats")]
    UnsupportedSurface,

    #[error("out of GPU memory while creating {0}")]
    OutOfMemory(String),

    #[error("GPU validation failed while creating {label}: {message}")]
    Validation { label: String, message: String },

    #[error("GPU backend failed while creating {label}: {message}")]
    Internal { label: String, message: String },

    #[error("invalid cluster configuration: {0}")]
    InvalidClusterConfig(String),

    #[error("invalid light configuration: {0}")]
    InvalidLightConfig(String),

    #[error("{label} needs {size} bytes but the device allows at most {limit}")]
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("{label} readback has {actual} bytes, expected {expected}")]
    ReadbackSize {
        label: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("buffer mapping was dropped before it completed")]
    MapDropped,

    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
