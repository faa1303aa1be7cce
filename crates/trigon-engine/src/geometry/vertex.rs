use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use super::{VertexAttribute, VertexLayout};

/// A fixed-size, plain-old-data vertex record with a matching attribute layout.
pub trait Vertex: Pod {
    fn layout() -> VertexLayout;
}

/// Position only; stride of 3 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn layout() -> VertexLayout {
        VertexLayout::new(
            size_of::<Self>() as u64,
            vec![VertexAttribute::float32(0, 3, offset_of!(Self, position) as u64)],
        )
    }
}

/// Position plus per-vertex color; stride of 6 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for ColorVertex {
    fn layout() -> VertexLayout {
        VertexLayout::new(
            size_of::<Self>() as u64,
            vec![
                VertexAttribute::float32(0, 3, offset_of!(Self, position) as u64),
                VertexAttribute::float32(1, 3, offset_of!(Self, color) as u64),
            ],
        )
    }
}

pub const TRIANGLE: [PositionVertex; 3] = [
    PositionVertex { position: [0.5, -0.5, 0.0] },
    PositionVertex { position: [-0.5, -0.5, 0.0] },
    PositionVertex { position: [0.0, 0.5, 0.0] },
];

/// Red, green and blue corners; the fragment stage interpolates between them.
pub const GRADIENT_TRIANGLE: [ColorVertex; 3] = [
    ColorVertex { position: [0.5, -0.5, 0.0], color: [1.0, 0.0, 0.0] },
    ColorVertex { position: [-0.5, -0.5, 0.0], color: [0.0, 1.0, 0.0] },
    ColorVertex { position: [0.0, 0.5, 0.0], color: [0.0, 0.0, 1.0] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_vertex_stride_is_three_floats() {
        let layout = PositionVertex::layout();
        assert_eq!(layout.stride, 12);
        assert_eq!(layout.attributes, vec![VertexAttribute::float32(0, 3, 0)]);
        assert_eq!(layout.validate(), Ok(()));
    }

    #[test]
    fn color_vertex_interleaves_position_then_color() {
        let layout = ColorVertex::layout();
        assert_eq!(layout.stride, 24);
        assert_eq!(layout.attribute(0).map(|a| a.offset), Some(0));
        assert_eq!(layout.attribute(1).map(|a| a.offset), Some(12));
        assert_eq!(layout.validate(), Ok(()));
    }
}
