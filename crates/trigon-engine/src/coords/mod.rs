//! Small value types shared by the window and GPU layers.

mod color;
mod viewport;

pub use color::Color;
pub use viewport::Viewport;
