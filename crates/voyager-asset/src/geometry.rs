use glam::Vec3;

use crate::{bounds::BoundingBox, index::AssetIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryMode {
    Points,
    LineStrip,
    LineList,
    TriangleStrip,
    TriangleList,
}

pub type Position = Vec<[f32; 3]>;
pub type Normal = Vec<[f32; 3]>;
pub type TexCoord = Vec<[f32; 2]>;
pub type VertexColor = Vec<[f32; 4]>;

#[derive(Debug, Clone, Default)]
pub struct GeometryAttributes {
    pub position: Position,
    pub normal: Normal,
    pub tex_coord: TexCoord,
    pub color: VertexColor,
}

/// Vertex buffers of a single draw call.
#[derive(Debug, Clone)]
pub struct GeometryAsset {
    pub id: AssetIndex,
    pub attributes: GeometryAttributes,
    pub indices: Option<Vec<u32>>,
    pub mode: GeometryMode,
}

impl GeometryAsset {
    pub fn new(id: AssetIndex, attributes: GeometryAttributes, indices: Option<Vec<u32>>) -> Self {
        Self {
            id,
            attributes,
            indices,
            mode: GeometryMode::TriangleList,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.attributes.position.len()
    }

    pub fn face_count(&self) -> usize {
        let count = self
            .indices
            .as_ref()
            .map_or(self.vertex_count(), Vec::len);
        match self.mode {
            GeometryMode::TriangleList => count / 3,
            GeometryMode::TriangleStrip => count.saturating_sub(2),
            _ => 0,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(
            self.attributes
                .position
                .iter()
                .map(|position| Vec3::from_array(*position)),
        )
    }
}
