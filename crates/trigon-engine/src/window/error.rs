/// Failures raised by a display implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DisplayError {
    #[error("windowing subsystem failed to start: {0}")]
    PlatformInit(String),

    #[error("window creation failed: {0}")]
    WindowCreation(String),

    #[error("no window has been created")]
    NoWindow,

    #[error("GPU context is already current on another thread")]
    ContextThread,
}
