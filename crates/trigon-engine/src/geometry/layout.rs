/// Scalar type of one attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ComponentType {
    Float32,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Self::Float32 => 4,
        }
    }
}

/// Maps a slice of every vertex record to one shader input slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub slot: u32,
    /// 1 to 4.
    pub components: u8,
    pub component_type: ComponentType,
    /// Byte offset from the start of the vertex record.
    pub offset: u64,
}

impl VertexAttribute {
    pub const fn float32(slot: u32, components: u8, offset: u64) -> Self {
        Self {
            slot,
            components,
            component_type: ComponentType::Float32,
            offset,
        }
    }

    /// Byte size of the attribute inside a record.
    pub const fn size(&self) -> u64 {
        self.components as u64 * self.component_type.size()
    }

    fn wgpu_format(&self) -> wgpu::VertexFormat {
        match (self.component_type, self.components) {
            (ComponentType::Float32, 1) => wgpu::VertexFormat::Float32,
            (ComponentType::Float32, 2) => wgpu::VertexFormat::Float32x2,
            (ComponentType::Float32, 3) => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("stride must be non-zero")]
    ZeroStride,

    #[error("attribute at slot {slot} has {components} components; expected 1 to 4")]
    ComponentCount { slot: u32, components: u8 },

    #[error("attribute at slot {slot} ends at byte {end}, past the stride of {stride}")]
    PastStride { slot: u32, end: u64, stride: u64 },

    #[error("slot {0} is bound more than once")]
    DuplicateSlot(u32),

    #[error("attributes at slots {0} and {1} overlap")]
    Overlap(u32, u32),

    #[error("{len} bytes is not a whole number of {stride}-byte vertices")]
    Misaligned { len: usize, stride: u64 },
}

/// Interleaving description of one vertex buffer.
///
/// `stride` and each attribute `offset` must mirror the in-memory layout of the
/// vertex record; a mismatch draws garbage rather than failing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    /// Distance in bytes between consecutive vertex records.
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(stride: u64, attributes: Vec<VertexAttribute>) -> Self {
        Self { stride, attributes }
    }

    pub fn attribute(&self, slot: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.slot == slot)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.stride == 0 {
            return Err(LayoutError::ZeroStride);
        }

        for (i, attr) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&attr.components) {
                return Err(LayoutError::ComponentCount {
                    slot: attr.slot,
                    components: attr.components,
                });
            }

            let end = match attr.offset.checked_add(attr.size()) {
                Some(end) if end <= self.stride => end,
                overflowed => {
                    return Err(LayoutError::PastStride {
                        slot: attr.slot,
                        end: overflowed.unwrap_or(u64::MAX),
                        stride: self.stride,
                    });
                }
            };

            for other in &self.attributes[..i] {
                if other.slot == attr.slot {
                    return Err(LayoutError::DuplicateSlot(attr.slot));
                }
                // `other` already passed the stride check, so its end cannot overflow.
                let other_end = other.offset.saturating_add(other.size());
                let disjoint = end <= other.offset || other_end <= attr.offset;
                if !disjoint {
                    return Err(LayoutError::Overlap(other.slot, attr.slot));
                }
            }
        }

        Ok(())
    }

    /// Number of whole vertex records in `len` bytes.
    pub fn vertex_count(&self, len: usize) -> Result<u32, LayoutError> {
        if self.stride == 0 {
            return Err(LayoutError::ZeroStride);
        }
        if len as u64 % self.stride != 0 {
            return Err(LayoutError::Misaligned {
                len,
                stride: self.stride,
            });
        }
        Ok((len as u64 / self.stride) as u32)
    }

    /// Reads `bytes` back through this layout.
    ///
    /// Each vertex decodes to its attribute components, attributes in slot
    /// order, so a layout that mirrors the record reproduces the record's floats.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Vec<f32>>, LayoutError> {
        self.validate()?;
        let count = self.vertex_count(bytes.len())?;

        let mut attributes: Vec<&VertexAttribute> = self.attributes.iter().collect();
        attributes.sort_by_key(|a| a.slot);

        let floats_per_vertex = attributes.iter().map(|a| a.components as usize).sum();

        let vertices = (0..count as u64)
            .map(|v| {
                let record = &bytes[(v * self.stride) as usize..((v + 1) * self.stride) as usize];
                let mut out = Vec::with_capacity(floats_per_vertex);
                for attr in &attributes {
                    for c in 0..attr.components as u64 {
                        let at = (attr.offset + c * attr.component_type.size()) as usize;
                        let raw = [record[at], record[at + 1], record[at + 2], record[at + 3]];
                        out.push(f32::from_ne_bytes(raw));
                    }
                }
                out
            })
            .collect();

        Ok(vertices)
    }

    pub(crate) fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.wgpu_format(),
                offset: a.offset,
                shader_location: a.slot,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interleaved() -> VertexLayout {
        VertexLayout::new(
            24,
            vec![
                VertexAttribute::float32(0, 3, 0),
                VertexAttribute::float32(1, 3, 12),
            ],
        )
    }

    #[test]
    fn interleaved_layout_is_valid() {
        assert_eq!(interleaved().validate(), Ok(()));
        assert_eq!(interleaved().attribute(1).map(|a| a.offset), Some(12));
    }

    #[test]
    fn attribute_past_stride_is_rejected() {
        let layout = VertexLayout::new(20, vec![VertexAttribute::float32(0, 3, 12)]);
        assert_eq!(
            layout.validate(),
            Err(LayoutError::PastStride {
                slot: 0,
                end: 24,
                stride: 20
            })
        );
    }

    #[test]
    fn offset_near_u64_max_is_rejected_not_overflowed() {
        let layout = VertexLayout::new(12, vec![VertexAttribute::float32(0, 3, u64::MAX - 4)]);
        assert_eq!(
            layout.validate(),
            Err(LayoutError::PastStride {
                slot: 0,
                end: u64::MAX,
                stride: 12
            })
        );
    }

    #[test]
    fn overlapping_and_duplicate_slots_are_rejected() {
        let overlap = VertexLayout::new(
            24,
            vec![
                VertexAttribute::float32(0, 3, 0),
                VertexAttribute::float32(1, 3, 8),
            ],
        );
        assert_eq!(overlap.validate(), Err(LayoutError::Overlap(0, 1)));

        let duplicate = VertexLayout::new(
            24,
            vec![
                VertexAttribute::float32(0, 3, 0),
                VertexAttribute::float32(0, 3, 12),
            ],
        );
        assert_eq!(duplicate.validate(), Err(LayoutError::DuplicateSlot(0)));
    }

    #[test]
    fn vertex_count_requires_whole_records() {
        let layout = interleaved();
        assert_eq!(layout.vertex_count(72), Ok(3));
        assert_eq!(
            layout.vertex_count(70),
            Err(LayoutError::Misaligned { len: 70, stride: 24 })
        );
    }

    #[test]
    fn decode_reads_attributes_in_slot_order() {
        // Color stored first in memory, bound to slot 1.
        let layout = VertexLayout::new(
            24,
            vec![
                VertexAttribute::float32(1, 3, 0),
                VertexAttribute::float32(0, 3, 12),
            ],
        );
        let record: [f32; 6] = [0.1, 0.2, 0.3, 1.0, 2.0, 3.0];
        let decoded = layout.decode(bytemuck::cast_slice(&record)).unwrap();
        assert_eq!(decoded, vec![vec![1.0, 2.0, 3.0, 0.1, 0.2, 0.3]]);
    }

    #[test]
    fn wgpu_attributes_mirror_layout() {
        let attrs = interleaved().wgpu_attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[1].shader_location, 1);
        assert_eq!(attrs[1].format, wgpu::VertexFormat::Float32x3);
    }
}
