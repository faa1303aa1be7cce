use crate::coords::Color;

use super::Topology;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct DrawCall {
    pub topology: Topology,
    pub first: u32,
    pub count: u32,
}

#[derive(Debug)]
pub(crate) struct BoundProgram {
    pub id: u64,
    pub pipeline: wgpu::RenderPipeline,
    pub topology: Topology,
}

/// State recorded between `present` calls.
///
/// Bindings persist across frames like GL bind points do; the clear and the
/// draw are consumed by each `present`.
#[derive(Debug, Default)]
pub(crate) struct FrameCommands {
    pub clear: Option<Color>,
    pub program: Option<BoundProgram>,
    pub vertex_buffer: Option<(u64, wgpu::Buffer)>,
    pub draw: Option<DrawCall>,
}

impl FrameCommands {
    pub fn record_draw(&mut self, draw: DrawCall) {
        if self.draw.replace(draw).is_some() {
            log::warn!("more than one draw recorded in a frame; only the last is kept");
        }
    }

    /// Pipeline and buffer to encode the pending draw with, if the draw is
    /// well-defined.
    pub fn encodable_draw(&self) -> Option<(&wgpu::RenderPipeline, &wgpu::Buffer, DrawCall)> {
        let draw = self.draw?;
        let program = self.program.as_ref()?;
        let (_, buffer) = self.vertex_buffer.as_ref()?;

        if program.topology != draw.topology {
            log::warn!(
                "draw topology {:?} does not match program topology {:?}; skipped",
                draw.topology,
                program.topology
            );
            return None;
        }

        Some((&program.pipeline, buffer, draw))
    }
}
