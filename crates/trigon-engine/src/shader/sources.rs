use std::borrow::Cow;

/// Source text for the two stages of one program.
///
/// The built-in variants embed their WGSL at build time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Position-only triangle in a flat color.
    pub fn plain() -> Self {
        Self::new(
            include_str!("wgsl/plain.vert.wgsl"),
            include_str!("wgsl/plain.frag.wgsl"),
        )
    }

    /// Per-vertex color interpolated across the triangle.
    pub fn gradient() -> Self {
        Self::new(
            include_str!("wgsl/gradient.vert.wgsl"),
            include_str!("wgsl/gradient.frag.wgsl"),
        )
    }
}
