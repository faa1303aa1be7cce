//! Render loop timing.
//!
//! One `FrameClock` per session; `tick()` once per presented frame.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
