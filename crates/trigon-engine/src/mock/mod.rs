//! In-memory backend that records every call, for driving sessions in tests.
//!
//! Shader sources still go through the real WGSL front end, so compile and
//! link diagnostics match what the wgpu backend reports.

mod device;
mod display;
mod trace;

pub use device::{MockBuffer, MockDevice, MockLoader, MockProgram, MockShader};
pub use display::{MockDisplay, MockResolver};
pub use trace::{Call, CallTrace};
