use crate::coords::{Color, Viewport};
use crate::geometry::VertexLayout;
use crate::shader::ShaderStage;

use super::GpuError;

/// Primitive assembly mode for a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Topology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

impl Topology {
    pub(crate) fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::PointList => wgpu::PrimitiveTopology::PointList,
            Self::LineList => wgpu::PrimitiveTopology::LineList,
            Self::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Result of a compile or link request.
///
/// The handle is returned even when the driver rejected the input: the object
/// exists and must still be released by its owner.
#[derive(Debug)]
pub struct Outcome<H> {
    pub handle: H,
    /// Driver diagnostic text; `Some` means the request failed.
    pub log: Option<String>,
}

impl<H> Outcome<H> {
    pub fn success(handle: H) -> Self {
        Self { handle, log: None }
    }

    pub fn failure(handle: H, log: impl Into<String>) -> Self {
        Self {
            handle,
            log: Some(log.into()),
        }
    }
}

/// GPU entry points resolved against the current context.
///
/// Obtaining one requires a successful `GpuLoader::load`, and every GPU-facing
/// component takes it as a parameter, so no GPU call can be issued before the
/// loader ran.
///
/// Bind calls record state for the next `draw_arrays`; nothing reaches the
/// screen until `present`.
pub trait GpuDevice {
    type Buffer;
    type Shader;
    type Program;

    /// 0 presents immediately, 1 waits for the next vertical refresh.
    fn set_swap_interval(&mut self, interval: u32);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Allocates a static vertex buffer holding `data`.
    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        layout: &VertexLayout,
    ) -> Result<Self::Buffer, GpuError>;

    fn delete_vertex_buffer(&mut self, buffer: Self::Buffer);

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Outcome<Self::Shader>;

    fn delete_shader(&mut self, shader: Self::Shader);

    /// Links two compiled stages. `layout` binds attribute slots to vertex inputs.
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
        layout: &VertexLayout,
        topology: Topology,
    ) -> Outcome<Self::Program>;

    fn delete_program(&mut self, program: Self::Program);

    fn clear(&mut self, color: Color);

    /// `None` binds the null program: draws produce no fragments.
    fn use_program(&mut self, program: Option<&Self::Program>);

    fn bind_vertex_buffer(&mut self, buffer: Option<&Self::Buffer>);

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32);

    /// Submits the frame and flips it to the window.
    fn present(&mut self) -> Result<(), GpuError>;
}

/// Resolves GPU entry points against a current display context.
///
/// Runs once per session, after `Display::make_current`.
pub trait GpuLoader<R> {
    type Device: GpuDevice;

    fn load(&mut self, resolver: R) -> Result<Self::Device, GpuError>;
}
