/// Failures raised by a GPU backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GpuError {
    #[error("unsupported context request: {0}")]
    UnsupportedContext(String),

    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create device/queue: {0}")]
    Device(String),

    #[error("failed to allocate {what}: {reason}")]
    Allocation { what: &'static str, reason: String },

    #[error("failed to present frame: {0}")]
    Present(String),
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
