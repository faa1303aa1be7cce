//! Shader stages, the program they link into, and the front end both GPU
//! backends compile through.

mod diagnostic;
mod pipeline;
mod reflect;
mod sources;
mod stage;

pub use diagnostic::{DiagnosticLog, LOG_CAPACITY};
pub use pipeline::{CompiledStage, PipelineState, ShaderError, ShaderPipeline, StageStatus};
pub use reflect::{check_link, compile_wgsl, InterfaceSlot, SlotType, StageInterface};
pub use sources::ShaderSources;
pub use stage::ShaderStage;
