/// Window parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "trigon".to_string(),
        }
    }
}

/// GPU API profile requested for the window's context.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextProfile {
    /// Programmable pipeline only; no fixed-function fallback.
    Core,
    /// Legacy fixed-function entry points available.
    Compatibility,
}

/// Desired GPU API version and profile. Set before the window is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ContextRequest {
    pub major: u8,
    pub minor: u8,
    pub profile: ContextProfile,
}

impl ContextRequest {
    pub const fn core(major: u8, minor: u8) -> Self {
        Self {
            major,
            minor,
            profile: ContextProfile::Core,
        }
    }
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self::core(3, 3)
    }
}

/// Keys the session cares about. Everything else maps to `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Other,
}

/// Event delivered synchronously from `Display::poll_events`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DisplayEvent {
    /// Drawable size changed, in physical pixels.
    Resized { width: u32, height: u32 },
}

/// One OS window plus its GPU drawing context.
///
/// Lifecycle, in call order:
/// `initialize_platform` → `request_context` → `create_window` → `make_current`
/// → loop { `should_close`, `poll_events`, `swap_buffers` } → `destroy_window`
/// → `shutdown_platform`.
///
/// All calls happen on one thread.
pub trait Display {
    /// Whatever the GPU loader needs to resolve entry points against the
    /// current context.
    type Resolver;

    fn initialize_platform(&mut self) -> Result<(), super::DisplayError>;

    /// Applies to windows created afterwards.
    fn request_context(&mut self, request: ContextRequest);

    fn create_window(&mut self, config: &WindowConfig) -> Result<(), super::DisplayError>;

    /// Binds the context to the calling thread and hands out its resolver.
    fn make_current(&mut self) -> Result<Self::Resolver, super::DisplayError>;

    fn should_close(&self) -> bool;

    /// Non-blocking. Queued events are handed to `handler` before this returns.
    fn poll_events(&mut self, handler: &mut dyn FnMut(DisplayEvent));

    fn is_key_pressed(&self, key: Key) -> bool;

    fn request_close(&mut self);

    fn swap_buffers(&mut self);

    fn destroy_window(&mut self);

    fn shutdown_platform(&mut self);
}
