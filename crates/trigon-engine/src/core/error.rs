use crate::device::GpuError;
use crate::geometry::GeometryError;
use crate::shader::{DiagnosticLog, ShaderError, ShaderStage};
use crate::window::DisplayError;

/// Why a session ended early.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("failed to initialize platform: {0}")]
    PlatformInit(String),

    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("failed to load GPU entry points: {0}")]
    Loader(#[source] GpuError),

    #[error("GPU allocation failed: {0}")]
    GpuAllocation(#[source] GpuError),

    #[error("invalid geometry: {0}")]
    Geometry(#[source] GeometryError),

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: DiagnosticLog },

    #[error("shader program failed to link:\n{log}")]
    ShaderLink { log: DiagnosticLog },

    #[error("failed to present frame: {0}")]
    Present(#[source] GpuError),
}

impl SessionError {
    /// Shader errors are only reportable: whether they end the session is a
    /// policy decision. Everything else leaves nothing to render with.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ShaderCompile { .. } | Self::ShaderLink { .. })
    }

    /// Process exit status for a session that ended with this error.
    ///
    /// Initialization failures use 255 (`-1` as a byte); failures after the
    /// context existed use 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PlatformInit(_) | Self::WindowCreation(_) | Self::Loader(_) => 255,
            _ => 1,
        }
    }
}

impl From<DisplayError> for SessionError {
    fn from(err: DisplayError) -> Self {
        match err {
            DisplayError::PlatformInit(reason) => Self::PlatformInit(reason),
            DisplayError::WindowCreation(reason) => Self::WindowCreation(reason),
            other => Self::WindowCreation(other.to_string()),
        }
    }
}

impl From<GeometryError> for SessionError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Gpu(err) => Self::GpuAllocation(err),
            other => Self::Geometry(other),
        }
    }
}

impl From<ShaderError> for SessionError {
    fn from(err: ShaderError) -> Self {
        match err {
            ShaderError::Compile { stage, log } => Self::ShaderCompile { stage, log },
            ShaderError::Link { log } => Self::ShaderLink { log },
            other => Self::ShaderLink {
                log: DiagnosticLog::capture(&other.to_string()),
            },
        }
    }
}
