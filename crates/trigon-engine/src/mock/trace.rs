use std::cell::RefCell;
use std::rc::Rc;

use crate::coords::{Color, Viewport};
use crate::device::Topology;
use crate::shader::ShaderStage;
use crate::window::ContextRequest;

/// One observable call into the mock display or device.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitializePlatform,
    RequestContext(ContextRequest),
    CreateWindow { width: u32, height: u32 },
    MakeCurrent,
    PollEvents,
    RequestClose,
    SwapBuffers,
    DestroyWindow,
    ShutdownPlatform,

    Load,
    SetSwapInterval(u32),
    SetViewport(Viewport),
    CreateBuffer { id: u32, bytes: usize },
    DeleteBuffer(u32),
    CompileShader { id: u32, stage: ShaderStage, ok: bool },
    DeleteShader(u32),
    LinkProgram { id: u32, vertex: u32, fragment: u32, ok: bool },
    DeleteProgram(u32),
    Clear(Color),
    UseProgram(Option<u32>),
    BindBuffer(Option<u32>),
    Draw { topology: Topology, first: u32, count: u32 },
    Present,
    /// The device itself was dropped.
    DropDevice,
}

/// Ordered call log shared between the mock display and device.
#[derive(Debug, Clone, Default)]
pub struct CallTrace(Rc<RefCell<Vec<Call>>>);

impl CallTrace {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Index of the first matching call.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(|c| pred(c))
    }

    /// Index of the last matching call.
    pub fn last_position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().rposition(|c| pred(c))
    }

    pub fn draws(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Draw { .. }))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}
