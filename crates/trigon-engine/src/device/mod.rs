//! GPU device, entry-point loading and surface management.
//!
//! This module is responsible for:
//! - the `GpuDevice` seam every GPU-facing component is written against
//! - the `GpuLoader` that turns a current display context into a device
//! - the wgpu implementation: instance/adapter/device/queue, swapchain, frame submission

mod context;
mod error;
mod frame;
mod init;
mod loader;
mod surface;
mod traits;

pub use context::{WgpuBuffer, WgpuDevice, WgpuProgram, WgpuShader};
pub use error::{GpuError, SurfaceErrorAction};
pub use init::{limits_for, GpuInit};
pub use loader::{ContextResolver, DrawableTarget, WgpuLoader};
pub use traits::{GpuDevice, GpuLoader, Outcome, Topology};
