use thiserror::Error;

/// GPU setup and presentation failures.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
