//! Trigon engine crate.
//!
//! Owns one render session: the platform window, the GPU context, a static
//! triangle mesh, one linked shader program and the per-frame draw loop.

pub mod coords;
pub mod core;
pub mod device;
pub mod geometry;
pub mod logging;
pub mod shader;
pub mod time;
pub mod window;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
