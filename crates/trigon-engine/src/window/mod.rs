//! Display context: the OS window, its GPU context request and event polling.
//!
//! `Display` is the seam the session drives; `WinitDisplay` implements it on
//! top of a pumped `winit` event loop.

mod display;
mod error;
mod native;

pub use display::{ContextProfile, ContextRequest, Display, DisplayEvent, Key, WindowConfig};
pub use error::DisplayError;
pub use native::WinitDisplay;
