use crate::window::{ContextProfile, ContextRequest};

use super::GpuError;

/// wgpu-specific initialization knobs.
///
/// The API version and profile come from the display's `ContextRequest`;
/// vertical sync comes from `GpuDevice::set_swap_interval`. This struct holds
/// the rest.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Used if supported by the surface; otherwise the first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: true,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Maps a GL-style version request onto the wgpu limit tier of that hardware class.
///
/// - 3.x: WebGL2 / GLES 3.0 class
/// - 4.0 to 4.2: downlevel (GLES 3.1 / D3D11) class
/// - anything newer: full wgpu defaults
///
/// The compatibility profile is rejected: there is no fixed-function path.
pub fn limits_for(request: &ContextRequest) -> Result<wgpu::Limits, GpuError> {
    if request.profile == ContextProfile::Compatibility {
        return Err(GpuError::UnsupportedContext(format!(
            "{}.{} compatibility profile has no programmable-only equivalent",
            request.major, request.minor
        )));
    }

    match (request.major, request.minor) {
        (0..=2, _) => Err(GpuError::UnsupportedContext(format!(
            "{}.{} predates programmable vertex/fragment pipelines",
            request.major, request.minor
        ))),
        (3, _) => Ok(wgpu::Limits::downlevel_webgl2_defaults()),
        (4, 0..=2) => Ok(wgpu::Limits::downlevel_defaults()),
        _ => Ok(wgpu::Limits::default()),
    }
}
