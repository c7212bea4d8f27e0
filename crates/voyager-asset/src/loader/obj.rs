use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::Cursor,
};

use log::debug;
use tobj::{LoadError, LoadOptions};

use crate::{
    geometry::{GeometryAsset, GeometryAttributes},
    index::AssetIndex,
};

use super::{chunk_vec2, chunk_vec3};

#[derive(Debug)]
pub enum ObjLoadError {
    Obj(LoadError),
    /// The file parsed but holds no faces.
    Empty,
}

impl Display for ObjLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Obj(error) => Display::fmt(error, f),
            ObjLoadError::Empty => write!(f, "OBJ file contains no geometry"),
        }
    }
}

impl Error for ObjLoadError {}

impl From<LoadError> for ObjLoadError {
    fn from(value: LoadError) -> Self {
        ObjLoadError::Obj(value)
    }
}

/// Loads all objects of an OBJ file into a single indexed triangle list.
///
/// Material libraries are not loaded, the material of a geometry derivative
/// comes from its image assets.
pub fn load_obj_geometry(id: AssetIndex, buffer: &[u8]) -> Result<GeometryAsset, ObjLoadError> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut Cursor::new(buffer),
        &LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
        |_path| Err(LoadError::OpenFileFailed),
    )?;

    let mut attributes = GeometryAttributes::default();
    let mut indices = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let offset = attributes.position.len() as u32;
        let vertex_count = mesh.positions.len() / 3;

        attributes.position.extend(chunk_vec3(&mesh.positions));
        if !mesh.normals.is_empty() {
            attributes.normal.extend(chunk_vec3(&mesh.normals));
        }
        if !mesh.texcoords.is_empty() {
            // OBJ has its texture origin at the bottom left.
            attributes.tex_coord.extend(
                chunk_vec2(&mesh.texcoords)
                    .into_iter()
                    .map(|[u, v]| [u, 1.0 - v]),
            );
        }
        if !mesh.vertex_color.is_empty() {
            attributes.color.extend(
                chunk_vec3(&mesh.vertex_color)
                    .into_iter()
                    .map(|[r, g, b]| [r, g, b, 1.0]),
            );
        }
        indices.extend(mesh.indices.iter().map(|index| index + offset));
        debug!(
            "OBJ object {:?}: {} vertices, {} indices",
            model.name,
            vertex_count,
            mesh.indices.len()
        );
    }

    if indices.is_empty() {
        return Err(ObjLoadError::Empty);
    }

    // Optional attributes only survive if every object provided them.
    let vertex_count = attributes.position.len();
    if attributes.normal.len() != vertex_count {
        attributes.normal.clear();
    }
    if attributes.tex_coord.len() != vertex_count {
        attributes.tex_coord.clear();
    }
    if attributes.color.len() != vertex_count {
        attributes.color.clear();
    }

    Ok(GeometryAsset::new(id, attributes, Some(indices)))
}

#[cfg(test)]
pub(crate) mod test {
    use glam::Vec3;

    use super::{load_obj_geometry, ObjLoadError};
    use crate::bounds::BoundingBox;

    pub(crate) const QUAD: &str = "\
o quad
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 2.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn quad_is_triangulated() {
        let geometry = load_obj_geometry("quad.obj".into(), QUAD.as_bytes()).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.face_count(), 2);
        assert_eq!(geometry.attributes.tex_coord[0], [0.0, 1.0]);
        assert!(geometry.attributes.normal.is_empty());
        assert_eq!(
            geometry.bounding_box(),
            BoundingBox::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.0))
        );
    }

    #[test]
    fn objects_are_merged() {
        let source = format!(
            "{}o second\nv 5 5 5\nv 6 5 5\nv 5 6 5\nf 5 6 7\n",
            QUAD.replace("vt 0.0 0.0\nvt 1.0 0.0\nvt 1.0 1.0\nvt 0.0 1.0\n", "")
                .replace("f 1/1 2/2 3/3 4/4", "f 1 2 3 4")
        );
        let geometry = load_obj_geometry("two.obj".into(), source.as_bytes()).unwrap();
        assert_eq!(geometry.vertex_count(), 7);
        assert_eq!(geometry.face_count(), 3);
        assert_eq!(geometry.indices.as_ref().unwrap()[6..], [4, 5, 6]);
        assert_eq!(geometry.bounding_box().max, Vec3::new(6.0, 6.0, 5.0));
    }

    #[test]
    fn empty_file_is_an_error() {
        let result = load_obj_geometry("empty.obj".into(), b"# nothing here\n");
        assert!(matches!(result, Err(ObjLoadError::Empty)));
    }
}
