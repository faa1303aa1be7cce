//! Vertex data on the GPU and the attribute layout that feeds it to shaders.

mod buffer;
mod layout;
mod vertex;

pub use buffer::{GeometryBuffer, GeometryError};
pub use layout::{ComponentType, LayoutError, VertexAttribute, VertexLayout};
pub use vertex::{ColorVertex, PositionVertex, Vertex, GRADIENT_TRIANGLE, TRIANGLE};
