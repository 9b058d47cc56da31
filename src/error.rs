/// Errors that stop the viewer from starting up
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("window setup failed: {0}")]
    Window(String),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
