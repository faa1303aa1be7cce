use std::collections::{HashMap, HashSet};

use crate::coords::{Color, Viewport};
use crate::device::{GpuDevice, GpuError, GpuLoader, Outcome, Topology, limits_for};
use crate::geometry::VertexLayout;
use crate::shader::{self, ShaderStage, StageInterface};

use super::{Call, CallTrace, MockResolver};

#[derive(Debug)]
pub struct MockBuffer {
    id: u32,
}

#[derive(Debug)]
pub struct MockShader {
    id: u32,
    stage: ShaderStage,
    interface: Option<StageInterface>,
}

#[derive(Debug)]
pub struct MockProgram {
    id: u32,
}

impl MockBuffer {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl MockShader {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl MockProgram {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Loader for `MockDevice`. Applies the same context-version rules as the
/// wgpu loader.
#[derive(Debug)]
pub struct MockLoader {
    trace: CallTrace,
    fail: bool,
    failing_allocations: bool,
    loads: u32,
}

impl MockLoader {
    pub fn new(trace: CallTrace) -> Self {
        Self {
            trace,
            fail: false,
            failing_allocations: false,
            loads: 0,
        }
    }

    /// Entry points cannot be resolved.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Devices handed out refuse every buffer allocation.
    pub fn failing_allocations(mut self) -> Self {
        self.failing_allocations = true;
        self
    }

    pub fn loads(&self) -> u32 {
        self.loads
    }
}

impl GpuLoader<MockResolver> for MockLoader {
    type Device = MockDevice;

    fn load(&mut self, resolver: MockResolver) -> Result<MockDevice, GpuError> {
        self.loads += 1;
        self.trace.push(Call::Load);
        if self.fail {
            return Err(GpuError::Adapter("scripted loader failure".to_string()));
        }
        limits_for(&resolver.request)?;

        let device = MockDevice::new(self.trace.clone());
        Ok(if self.failing_allocations {
            device.failing_allocations()
        } else {
            device
        })
    }
}

/// Records calls and keeps buffer contents in memory.
///
/// Panics when a handle is used after it was deleted, so lifecycle mistakes
/// fail tests loudly.
#[derive(Debug)]
pub struct MockDevice {
    trace: CallTrace,
    next_id: u32,
    fail_allocations: bool,

    buffers: HashMap<u32, Vec<u8>>,
    shaders: HashSet<u32>,
    programs: HashSet<u32>,
}

impl MockDevice {
    pub fn new(trace: CallTrace) -> Self {
        Self {
            trace,
            next_id: 1,
            fail_allocations: false,
            buffers: HashMap::new(),
            shaders: HashSet::new(),
            programs: HashSet::new(),
        }
    }

    pub fn failing_allocations(mut self) -> Self {
        self.fail_allocations = true;
        self
    }

    /// Contents of a live buffer.
    pub fn buffer_data(&self, buffer: &MockBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer.id).map(Vec::as_slice)
    }

    /// Number of buffers, shaders and programs not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.buffers.len() + self.shaders.len() + self.programs.len()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GpuDevice for MockDevice {
    type Buffer = MockBuffer;
    type Shader = MockShader;
    type Program = MockProgram;

    fn set_swap_interval(&mut self, interval: u32) {
        self.trace.push(Call::SetSwapInterval(interval));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.trace.push(Call::SetViewport(viewport));
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        _layout: &VertexLayout,
    ) -> Result<MockBuffer, GpuError> {
        if self.fail_allocations {
            return Err(GpuError::Allocation {
                what: "vertex buffer",
                reason: "scripted allocation failure".to_string(),
            });
        }
        let id = self.allocate_id();
        self.trace.push(Call::CreateBuffer {
            id,
            bytes: data.len(),
        });
        self.buffers.insert(id, data.to_vec());
        Ok(MockBuffer { id })
    }

    fn delete_vertex_buffer(&mut self, buffer: MockBuffer) {
        assert!(
            self.buffers.remove(&buffer.id).is_some(),
            "buffer {} deleted twice",
            buffer.id
        );
        self.trace.push(Call::DeleteBuffer(buffer.id));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Outcome<MockShader> {
        let id = self.allocate_id();
        self.shaders.insert(id);
        let result = shader::compile_wgsl(stage, source);
        self.trace.push(Call::CompileShader {
            id,
            stage,
            ok: result.is_ok(),
        });

        match result {
            Ok(interface) => Outcome::success(MockShader {
                id,
                stage,
                interface: Some(interface),
            }),
            Err(log) => Outcome::failure(
                MockShader {
                    id,
                    stage,
                    interface: None,
                },
                log,
            ),
        }
    }

    fn delete_shader(&mut self, shader: MockShader) {
        assert!(
            self.shaders.remove(&shader.id),
            "shader {} deleted twice",
            shader.id
        );
        self.trace.push(Call::DeleteShader(shader.id));
    }

    fn link_program(
        &mut self,
        vertex: &MockShader,
        fragment: &MockShader,
        layout: &VertexLayout,
        _topology: Topology,
    ) -> Outcome<MockProgram> {
        assert!(self.shaders.contains(&vertex.id), "link with released vertex shader");
        assert!(self.shaders.contains(&fragment.id), "link with released fragment shader");

        let id = self.allocate_id();
        self.programs.insert(id);

        let result = match (&vertex.interface, &fragment.interface) {
            (Some(vs), Some(fs)) => shader::check_link(vs, fs, layout),
            _ => Err(format!(
                "{} or {} stage was not compiled",
                vertex.stage, fragment.stage
            )),
        };
        self.trace.push(Call::LinkProgram {
            id,
            vertex: vertex.id,
            fragment: fragment.id,
            ok: result.is_ok(),
        });

        match result {
            Ok(()) => Outcome::success(MockProgram { id }),
            Err(log) => Outcome::failure(MockProgram { id }, log),
        }
    }

    fn delete_program(&mut self, program: MockProgram) {
        assert!(
            self.programs.remove(&program.id),
            "program {} deleted twice",
            program.id
        );
        self.trace.push(Call::DeleteProgram(program.id));
    }

    fn clear(&mut self, color: Color) {
        self.trace.push(Call::Clear(color));
    }

    fn use_program(&mut self, program: Option<&MockProgram>) {
        if let Some(p) = program {
            assert!(self.programs.contains(&p.id), "use of released program {}", p.id);
        }
        self.trace.push(Call::UseProgram(program.map(|p| p.id)));
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<&MockBuffer>) {
        if let Some(b) = buffer {
            assert!(self.buffers.contains_key(&b.id), "bind of released buffer {}", b.id);
        }
        self.trace.push(Call::BindBuffer(buffer.map(|b| b.id)));
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        self.trace.push(Call::Draw {
            topology,
            first,
            count,
        });
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.trace.push(Call::Present);
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.trace.push(Call::DropDevice);
    }
}
