use crate::device::{GpuDevice, GpuError};

use super::{LayoutError, Vertex, VertexLayout};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GeometryError {
    #[error("no vertex data to upload")]
    Empty,

    #[error("invalid vertex layout: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("geometry buffer used after release")]
    Released,
}

/// Vertex data living on the GPU plus the layout describing it.
///
/// Created once before the render loop and released once after it. Binding a
/// released buffer is refused instead of reaching the GPU.
pub struct GeometryBuffer<G: GpuDevice> {
    handle: Option<G::Buffer>,
    layout: VertexLayout,
    vertex_count: u32,
    bound: bool,
}

impl<G: GpuDevice> GeometryBuffer<G> {
    /// Uploads raw interleaved vertex bytes described by `layout`.
    pub fn upload(gpu: &mut G, data: &[u8], layout: VertexLayout) -> Result<Self, GeometryError> {
        if data.is_empty() {
            return Err(GeometryError::Empty);
        }
        layout.validate()?;
        let vertex_count = layout.vertex_count(data.len())?;

        let handle = gpu.create_vertex_buffer(data, &layout)?;
        log::debug!(
            "uploaded {vertex_count} vertices ({} bytes, stride {})",
            data.len(),
            layout.stride
        );

        Ok(Self {
            handle: Some(handle),
            layout,
            vertex_count,
            bound: false,
        })
    }

    pub fn from_vertices<V: Vertex>(gpu: &mut G, vertices: &[V]) -> Result<Self, GeometryError> {
        Self::upload(gpu, bytemuck::cast_slice(vertices), V::layout())
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    /// The GPU handle, while the buffer is live.
    pub fn handle(&self) -> Option<&G::Buffer> {
        self.handle.as_ref()
    }

    pub fn bind(&mut self, gpu: &mut G) -> Result<(), GeometryError> {
        let handle = self.handle.as_ref().ok_or(GeometryError::Released)?;
        gpu.bind_vertex_buffer(Some(handle));
        self.bound = true;
        Ok(())
    }

    pub fn unbind(&mut self, gpu: &mut G) {
        if self.bound {
            gpu.bind_vertex_buffer(None);
            self.bound = false;
        }
    }

    /// Frees the GPU allocation. A second call is a logged no-op.
    pub fn release(&mut self, gpu: &mut G) {
        let Some(handle) = self.handle.take() else {
            log::warn!("geometry buffer released twice");
            return;
        };
        self.unbind(gpu);
        gpu.delete_vertex_buffer(handle);
        log::debug!("geometry buffer released");
    }
}

impl<G: GpuDevice> Drop for GeometryBuffer<G> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            log::warn!("geometry buffer dropped without release; freed with the GPU context");
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::geometry::{ColorVertex, PositionVertex, GRADIENT_TRIANGLE, TRIANGLE};
    use crate::mock::{Call, CallTrace, MockDevice};

    fn floats<V: Vertex>(vertices: &[V]) -> Vec<Vec<f32>> {
        let per_vertex = V::layout().stride as usize / 4;
        bytemuck::cast_slice::<V, f32>(vertices)
            .chunks(per_vertex)
            .map(<[f32]>::to_vec)
            .collect()
    }

    fn round_trip<V: Vertex>(vertices: &[V]) {
        let mut gpu = MockDevice::new(CallTrace::default());
        let mut geometry = GeometryBuffer::from_vertices(&mut gpu, vertices).unwrap();

        let handle = geometry.handle().unwrap();
        let uploaded = gpu.buffer_data(handle).unwrap().to_vec();
        let decoded = geometry.layout().decode(&uploaded).unwrap();

        assert_eq!(geometry.vertex_count() as usize, vertices.len());
        assert_eq!(decoded, floats(vertices));

        geometry.release(&mut gpu);
    }

    #[rstest]
    #[case::one(1)]
    #[case::three(3)]
    #[case::many(64)]
    fn position_layout_round_trips(#[case] count: usize) {
        let vertices: Vec<PositionVertex> = (0..count)
            .map(|i| PositionVertex { position: [i as f32, -(i as f32), 0.5] })
            .collect();
        round_trip(&vertices);
    }

    #[rstest]
    #[case::one(1)]
    #[case::three(3)]
    #[case::many(64)]
    fn color_layout_round_trips(#[case] count: usize) {
        let vertices: Vec<ColorVertex> = (0..count)
            .map(|i| ColorVertex {
                position: [i as f32, 0.25, -1.0],
                color: [0.0, i as f32 / 64.0, 1.0],
            })
            .collect();
        round_trip(&vertices);
    }

    #[test]
    fn builtin_triangles_round_trip() {
        round_trip(&TRIANGLE);
        round_trip(&GRADIENT_TRIANGLE);
    }

    #[test]
    fn empty_upload_is_rejected() {
        let mut gpu = MockDevice::new(CallTrace::default());
        let empty: [PositionVertex; 0] = [];
        assert!(matches!(
            GeometryBuffer::from_vertices(&mut gpu, &empty),
            Err(GeometryError::Empty)
        ));
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut gpu = MockDevice::new(CallTrace::default()).failing_allocations();
        assert!(matches!(
            GeometryBuffer::from_vertices(&mut gpu, &TRIANGLE),
            Err(GeometryError::Gpu(GpuError::Allocation { .. }))
        ));
    }

    #[test]
    fn released_buffer_is_never_bound_again() {
        let trace = CallTrace::default();
        let mut gpu = MockDevice::new(trace.clone());
        let mut geometry = GeometryBuffer::from_vertices(&mut gpu, &TRIANGLE).unwrap();

        geometry.bind(&mut gpu).unwrap();
        geometry.release(&mut gpu);
        assert!(geometry.is_released());
        assert!(matches!(geometry.bind(&mut gpu), Err(GeometryError::Released)));

        // Second release must not reach the GPU.
        geometry.release(&mut gpu);

        let calls = trace.calls();
        let deletes = calls
            .iter()
            .filter(|c| matches!(c, Call::DeleteBuffer(_)))
            .count();
        assert_eq!(deletes, 1);
        let delete_at = trace.position(|c| matches!(c, Call::DeleteBuffer(_))).unwrap();
        assert!(calls[delete_at..]
            .iter()
            .all(|c| !matches!(c, Call::BindBuffer(Some(_)))));
    }
}
