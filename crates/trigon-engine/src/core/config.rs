use crate::coords::Color;
use crate::device::GpuDevice;
use crate::geometry::{GeometryBuffer, GeometryError, GRADIENT_TRIANGLE, TRIANGLE};
use crate::shader::ShaderSources;
use crate::window::{ContextRequest, WindowConfig};

/// Which triangle the session draws.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Variant {
    /// Position-only vertices, flat fragment color.
    #[default]
    Plain,
    /// Per-vertex color interpolated across the face.
    Gradient,
}

impl Variant {
    pub fn shaders(self) -> ShaderSources {
        match self {
            Self::Plain => ShaderSources::plain(),
            Self::Gradient => ShaderSources::gradient(),
        }
    }

    /// Uploads the variant's mesh with its matching layout.
    pub fn upload<G: GpuDevice>(self, gpu: &mut G) -> Result<GeometryBuffer<G>, GeometryError> {
        match self {
            Self::Plain => GeometryBuffer::from_vertices(gpu, &TRIANGLE),
            Self::Gradient => GeometryBuffer::from_vertices(gpu, &GRADIENT_TRIANGLE),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gradient => "gradient",
        }
    }
}

/// What to do when a shader stage fails to compile or the program fails to link.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ShaderFailurePolicy {
    /// Report and keep rendering with no program bound; nothing is drawn.
    #[default]
    Continue,
    /// Report and end the session with the shader error.
    Fatal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub window: WindowConfig,
    pub context: ContextRequest,

    /// 1 = vertical sync, 0 = present immediately.
    pub swap_interval: u32,

    pub clear_color: Color,
    pub shader_failure: ShaderFailurePolicy,

    /// Close the window after this many presented frames.
    pub frame_limit: Option<u64>,

    pub variant: Variant,

    /// Replaces the variant's built-in shader sources.
    pub shaders: Option<ShaderSources>,
}

impl SessionConfig {
    /// Sources the session compiles: the override if set, else the variant's.
    pub fn shader_sources(&self) -> ShaderSources {
        self.shaders
            .clone()
            .unwrap_or_else(|| self.variant.shaders())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            context: ContextRequest::default(),
            swap_interval: 1,
            clear_color: Color::black(),
            shader_failure: ShaderFailurePolicy::Continue,
            frame_limit: None,
            variant: Variant::Plain,
            shaders: None,
        }
    }
}
