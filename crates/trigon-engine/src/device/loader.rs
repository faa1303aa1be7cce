use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use crate::window::ContextRequest;

use super::{GpuError, GpuInit, GpuLoader, WgpuDevice};

/// Anything a wgpu surface can be created for.
pub trait DrawableTarget: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static {
    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> (u32, u32);
}

impl DrawableTarget for Window {
    fn drawable_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}

/// Handed out by `Display::make_current`: the window whose context is current
/// and the context it was asked to negotiate.
#[derive(Debug)]
pub struct ContextResolver<T> {
    pub target: Arc<T>,
    pub request: ContextRequest,
}

/// Loads a `WgpuDevice` for a window.
#[derive(Debug, Clone, Default)]
pub struct WgpuLoader {
    init: GpuInit,
}

impl WgpuLoader {
    pub fn new(init: GpuInit) -> Self {
        Self { init }
    }
}

impl<T: DrawableTarget> GpuLoader<ContextResolver<T>> for WgpuLoader {
    type Device = WgpuDevice;

    fn load(&mut self, resolver: ContextResolver<T>) -> Result<WgpuDevice, GpuError> {
        // Adapter/device acquisition is asynchronous under wgpu.
        pollster::block_on(WgpuDevice::new(resolver, &self.init))
    }
}
