use std::sync::Arc;

use crate::{bounds::BoundingBox, geometry::GeometryAsset, material::PbrMaterial};

#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub geometry: Arc<GeometryAsset>,
    pub material: Arc<PbrMaterial>,
}

#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveAsset>,
}

impl MeshAsset {
    pub fn new(geometry: Arc<GeometryAsset>, material: Arc<PbrMaterial>) -> Self {
        Self {
            name: None,
            primitives: vec![PrimitiveAsset { geometry, material }],
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.primitives
            .iter()
            .map(|primitive| primitive.geometry.bounding_box())
            .fold(BoundingBox::EMPTY, |bounds, primitive| bounds.union(&primitive))
    }
}
