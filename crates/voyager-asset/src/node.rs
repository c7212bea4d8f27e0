use glam::{Mat4, Quat, Vec3};

use crate::{
    bounds::BoundingBox,
    mesh::{MeshAsset, PrimitiveAsset},
};

#[derive(Debug, Clone)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed {
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
}

impl Default for NodeTransform {
    fn default() -> Self {
        NodeTransform::Decomposed {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn matrix(&self) -> Mat4 {
        match self {
            NodeTransform::Matrix(matrix) => *matrix,
            NodeTransform::Decomposed {
                translation,
                rotation,
                scale,
            } => Mat4::from_scale_rotation_translation(*scale, *rotation, *translation),
        }
    }
}

/// Renderable scene-graph node. A loaded derivative is a tree of these.
#[derive(Debug, Clone, Default)]
pub struct NodeAsset {
    pub name: Option<String>,
    pub transform: Option<NodeTransform>,
    pub mesh: Option<MeshAsset>,
    pub children: Vec<NodeAsset>,
}

impl NodeAsset {
    pub fn from_mesh(mesh: MeshAsset) -> Self {
        Self {
            name: mesh.name.clone(),
            mesh: Some(mesh),
            ..Default::default()
        }
    }

    pub fn group(name: Option<String>, children: Vec<NodeAsset>) -> Self {
        Self {
            name,
            children,
            ..Default::default()
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.transform
            .as_ref()
            .map_or(Mat4::IDENTITY, NodeTransform::matrix)
    }

    /// Calls `f` for every mesh in the tree with its world matrix, relative
    /// to the parent of this node.
    pub fn visit_meshes(&self, parent: &Mat4, f: &mut impl FnMut(&Mat4, &MeshAsset)) {
        let world = *parent * self.local_matrix();
        if let Some(mesh) = &self.mesh {
            f(&world, mesh);
        }
        for child in &self.children {
            child.visit_meshes(&world, f);
        }
    }

    pub fn for_each_primitive(&self, f: &mut impl FnMut(&PrimitiveAsset)) {
        if let Some(mesh) = &self.mesh {
            mesh.primitives.iter().for_each(&mut *f);
        }
        for child in &self.children {
            child.for_each_primitive(f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let own = usize::from(self.mesh.is_some());
        own + self.children.iter().map(NodeAsset::mesh_count).sum::<usize>()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        self.visit_meshes(&Mat4::IDENTITY, &mut |world, mesh| {
            bounds = bounds.union(&mesh.bounding_box().transform(world));
        });
        bounds
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use glam::{Mat4, Quat, Vec3};

    use super::{NodeAsset, NodeTransform};
    use crate::{
        bounds::BoundingBox,
        geometry::{GeometryAsset, GeometryAttributes},
        material::PbrMaterial,
        mesh::MeshAsset,
    };

    fn unit_triangle() -> MeshAsset {
        let geometry = GeometryAsset::new(
            "triangle.obj".into(),
            GeometryAttributes {
                position: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                ..Default::default()
            },
            None,
        );
        MeshAsset::new(Arc::new(geometry), Arc::new(PbrMaterial::default()))
    }

    #[test]
    fn bounding_box_follows_transforms() {
        let mut child = NodeAsset::from_mesh(unit_triangle());
        child.transform = Some(NodeTransform::Decomposed {
            translation: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        });
        let mut root = NodeAsset::group(None, vec![child]);
        root.transform = Some(NodeTransform::Matrix(Mat4::from_translation(Vec3::X)));

        assert_eq!(
            root.bounding_box(),
            BoundingBox::new(Vec3::new(1.0, 0.0, 5.0), Vec3::new(3.0, 2.0, 5.0))
        );
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn empty_tree_has_empty_bounds() {
        assert!(NodeAsset::group(None, vec![]).bounding_box().is_empty());
    }
}
