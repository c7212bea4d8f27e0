use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    future::Future,
    io::Cursor,
    marker::PhantomData,
    sync::Arc,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{mesh::Mode, scene::Transform, Document, Gltf, Material, Mesh, Node, Primitive};
use image::{guess_format, ImageError, ImageFormat, ImageReader};
use log::{debug, warn};

use crate::{
    geometry::{GeometryAsset, GeometryAttributes, GeometryMode},
    index::{AssetIndex, ResourceType},
    material::PbrMaterial,
    mesh::{MeshAsset, PrimitiveAsset},
    node::{NodeAsset, NodeTransform},
    texture::TextureAsset,
};

use self::scheme::{Scheme, SchemeError};
use super::texture::texture_from_image;

pub mod scheme;

#[derive(Debug, Clone)]
pub enum GltfImageSource {
    Buffer(usize),
    Uri(String),
}

impl Display for GltfImageSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfImageSource::Buffer(index) => write!(f, "buffer #{}", index),
            GltfImageSource::Uri(uri) => Display::fmt(uri, f),
        }
    }
}

#[derive(Debug)]
pub enum GltfLoaderError<E> {
    Gltf(gltf::Error),
    Io(E),
    InvalidScheme(SchemeError),
    MissingBlob,
    BadBufferMime(String, Option<String>),
    BadImage(GltfImageSource, ImageError),
    BadImageMime(GltfImageSource, String),
    ImageBufferOutOfBounds(usize, usize, usize),
    UnsupportedPrimitiveMode(Mode),
    MissingPositions(usize),
    NodeCycle(usize),
    NoScene,
}

impl<E: Display> Display for GltfLoaderError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoaderError::Gltf(error) => Display::fmt(error, f),
            GltfLoaderError::Io(error) => Display::fmt(error, f),
            GltfLoaderError::InvalidScheme(error) => Display::fmt(error, f),
            GltfLoaderError::MissingBlob => write!(f, "GLB binary chunk is missing"),
            GltfLoaderError::BadBufferMime(name, mime) => {
                if let Some(mime) = mime {
                    write!(f, "Bad MIME {} for buffer {}", mime, name)
                } else {
                    write!(f, "No MIME for buffer {}", name)
                }
            }
            GltfLoaderError::BadImage(name, error) => write!(f, "Bad image {}: {}", name, error),
            GltfLoaderError::BadImageMime(name, mime) => {
                write!(f, "Bad MIME {} for image {}", mime, name)
            }
            GltfLoaderError::ImageBufferOutOfBounds(index, end, buffer_length) => write!(
                f,
                "View of image #{} ends at {}, buffer has {} bytes",
                index, end, buffer_length
            ),
            GltfLoaderError::UnsupportedPrimitiveMode(mode) => {
                write!(f, "Unsupported primitive mode: {:?}", mode)
            }
            GltfLoaderError::MissingPositions(mesh) => {
                write!(f, "Primitive of mesh #{} has no positions", mesh)
            }
            GltfLoaderError::NodeCycle(node) => {
                write!(f, "Node #{} is its own descendant", node)
            }
            GltfLoaderError::NoScene => write!(f, "Model contains no scene"),
        }
    }
}

impl<E> From<gltf::Error> for GltfLoaderError<E> {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

impl<E> From<SchemeError> for GltfLoaderError<E> {
    fn from(value: SchemeError) -> Self {
        Self::InvalidScheme(value)
    }
}

impl<E: Error> Error for GltfLoaderError<E> {}

struct GltfDocumentLoader<'a, E> {
    url: &'a str,
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    images: &'a [Arc<TextureAsset>],
    material_cache: HashMap<Option<usize>, Arc<PbrMaterial>>,
    mesh_cache: HashMap<usize, MeshAsset>,
    geometry_count: usize,
    // Nodes between the scene root and the node being loaded
    ancestors: Vec<usize>,
    _marker: PhantomData<E>,
}

impl<'a, E> GltfDocumentLoader<'a, E> {
    fn new(
        url: &'a str,
        document: &'a Document,
        buffers: &'a [Vec<u8>],
        images: &'a [Arc<TextureAsset>],
    ) -> Self {
        Self {
            url,
            document,
            buffers,
            images,
            material_cache: HashMap::new(),
            mesh_cache: HashMap::new(),
            geometry_count: 0,
            ancestors: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn image(&self, texture: gltf::Texture) -> Option<Arc<TextureAsset>> {
        let image = self.images.get(texture.source().index()).cloned();
        if image.is_none() {
            warn!(
                "Texture #{} of {} refers to a missing image",
                texture.index(),
                self.url
            );
        }
        image
    }

    fn load_material(&mut self, material: Material) -> Arc<PbrMaterial> {
        if let Some(material) = self.material_cache.get(&material.index()) {
            return material.clone();
        }

        let pbr = material.pbr_metallic_roughness();
        // Metalness and roughness are packed into one texture.
        let metallic_roughness = pbr
            .metallic_roughness_texture()
            .and_then(|info| self.image(info.texture()));
        let normal = material.normal_texture();
        let occlusion = material.occlusion_texture();

        let asset = Arc::new(PbrMaterial {
            name: material.name().map(str::to_string),
            color: pbr.base_color_factor(),
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            emissive: material.emissive_factor(),
            normal_scale: normal.as_ref().map_or(1.0, |normal| normal.scale()),
            occlusion_strength: occlusion
                .as_ref()
                .map_or(1.0, |occlusion| occlusion.strength()),
            double_sided: material.double_sided(),
            map: pbr
                .base_color_texture()
                .and_then(|info| self.image(info.texture())),
            ao_map: occlusion.and_then(|occlusion| self.image(occlusion.texture())),
            emissive_map: material
                .emissive_texture()
                .and_then(|info| self.image(info.texture())),
            metalness_map: metallic_roughness.clone(),
            roughness_map: metallic_roughness,
            normal_map: normal.and_then(|normal| self.image(normal.texture())),
        });
        self.material_cache.insert(material.index(), asset.clone());
        asset
    }

    fn load_primitive(
        &mut self,
        mesh: usize,
        primitive: Primitive,
    ) -> Result<PrimitiveAsset, GltfLoaderError<E>> {
        let mode = match primitive.mode() {
            Mode::Points => GeometryMode::Points,
            Mode::Lines => GeometryMode::LineList,
            Mode::LineStrip => GeometryMode::LineStrip,
            Mode::Triangles => GeometryMode::TriangleList,
            Mode::TriangleStrip => GeometryMode::TriangleStrip,
            mode => return Err(GltfLoaderError::UnsupportedPrimitiveMode(mode)),
        };

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let position: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(GltfLoaderError::MissingPositions(mesh))?
            .collect();
        let normal: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|normals| normals.collect())
            .unwrap_or_default();
        let tex_coord: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|tex_coords| tex_coords.into_f32().collect())
            .unwrap_or_default();
        let color: Vec<[f32; 4]> = reader
            .read_colors(0)
            .map(|colors| colors.into_rgba_f32().collect())
            .unwrap_or_default();
        let indices = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect());

        let id = AssetIndex::UrlTypeIndex(
            self.url.to_string(),
            ResourceType::Geometry,
            self.geometry_count,
        );
        self.geometry_count += 1;

        let mut geometry = GeometryAsset::new(
            id,
            GeometryAttributes {
                position,
                normal,
                tex_coord,
                color,
            },
            indices,
        );
        geometry.mode = mode;

        Ok(PrimitiveAsset {
            geometry: Arc::new(geometry),
            material: self.load_material(primitive.material()),
        })
    }

    fn load_mesh(&mut self, mesh: Mesh) -> Result<MeshAsset, GltfLoaderError<E>> {
        if let Some(asset) = self.mesh_cache.get(&mesh.index()) {
            return Ok(asset.clone());
        }
        let primitives = mesh
            .primitives()
            .map(|primitive| self.load_primitive(mesh.index(), primitive))
            .collect::<Result<_, _>>()?;
        let asset = MeshAsset {
            name: mesh.name().map(str::to_string),
            primitives,
        };
        self.mesh_cache.insert(mesh.index(), asset.clone());
        Ok(asset)
    }

    fn load_node(&mut self, node: Node) -> Result<NodeAsset, GltfLoaderError<E>> {
        if self.ancestors.contains(&node.index()) {
            return Err(GltfLoaderError::NodeCycle(node.index()));
        }
        let transform = match node.transform() {
            Transform::Matrix { matrix } => NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix)),
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            },
        };
        let mesh = node.mesh().map(|mesh| self.load_mesh(mesh)).transpose()?;
        self.ancestors.push(node.index());
        let children = node
            .children()
            .map(|child| self.load_node(child))
            .collect::<Result<_, _>>();
        self.ancestors.pop();
        let children = children?;

        Ok(NodeAsset {
            name: node.name().map(str::to_string),
            transform: Some(transform),
            mesh,
            children,
        })
    }

    fn load(&mut self) -> Result<NodeAsset, GltfLoaderError<E>> {
        let document = self.document;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(GltfLoaderError::NoScene)?;
        let nodes = scene
            .nodes()
            .map(|node| self.load_node(node))
            .collect::<Result<_, _>>()?;
        Ok(NodeAsset::group(scene.name().map(str::to_string), nodes))
    }
}

fn decode_image<E>(
    id: AssetIndex,
    source: GltfImageSource,
    data: &[u8],
    format: ImageFormat,
) -> Result<Arc<TextureAsset>, GltfLoaderError<E>> {
    let mut reader = ImageReader::new(Cursor::new(data));
    reader.set_format(format);
    let image = reader
        .decode()
        .map_err(|error| GltfLoaderError::BadImage(source, error))?;
    Ok(Arc::new(texture_from_image(id, image)))
}

/// Loads a glTF or GLB model.
///
/// External buffers and images are fetched with `fetch`, relative URIs are
/// resolved against `url`. Data URIs are decoded in place.
pub async fn load_gltf<F, Fut, E>(
    url: &str,
    data: &[u8],
    fetch: F,
) -> Result<NodeAsset, GltfLoaderError<E>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, E>>,
{
    let gltf = Gltf::from_slice(data)?;

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf.blob.clone().ok_or(GltfLoaderError::MissingBlob)?,
            gltf::buffer::Source::Uri(uri) => {
                let scheme = Scheme::try_from(uri)?;

                // If MIME is specified, check the MIME
                if let Scheme::Data(Some(mime), _) = &scheme {
                    if !mime.eq_ignore_ascii_case("application/octet-stream")
                        && !mime.eq_ignore_ascii_case("application/gltf-buffer")
                    {
                        return Err(GltfLoaderError::BadBufferMime(
                            uri.to_string(),
                            Some(mime.to_string()),
                        ));
                    }
                }

                let (_mime, data) = scheme
                    .load(url, &fetch)
                    .await
                    .map_err(GltfLoaderError::Io)?;
                data
            }
        };

        // Pad the data to 4 bytes with zeroes
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buffers.push(data);
    }

    let mut images = Vec::new();
    for (index, image) in gltf.images().enumerate() {
        let id = AssetIndex::UrlTypeIndex(url.to_string(), ResourceType::Texture, index);
        let texture = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer_index = view.buffer().index();
                let source = GltfImageSource::Buffer(buffer_index);
                let buffer = buffers.get(buffer_index).map_or(&[][..], Vec::as_slice);
                let end = view.offset() + view.length();
                let data = buffer.get(view.offset()..end).ok_or(
                    GltfLoaderError::ImageBufferOutOfBounds(index, end, buffer.len()),
                )?;

                let format = ImageFormat::from_mime_type(mime_type).ok_or_else(|| {
                    GltfLoaderError::BadImageMime(source.clone(), mime_type.to_string())
                })?;
                decode_image(id, source, data, format)?
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let source = GltfImageSource::Uri(uri.to_string());
                let (load_mime, data) = Scheme::try_from(uri)?
                    .load(url, &fetch)
                    .await
                    .map_err(GltfLoaderError::Io)?;

                let format = match mime_type.or(load_mime) {
                    Some(mime) => ImageFormat::from_mime_type(mime).ok_or_else(|| {
                        GltfLoaderError::BadImageMime(source.clone(), mime.to_string())
                    })?,
                    None => guess_format(&data)
                        .map_err(|error| GltfLoaderError::BadImage(source.clone(), error))?,
                };
                decode_image(id, source, &data, format)?
            }
        };
        images.push(texture);
    }

    debug!(
        "Model {}: {} buffers, {} images",
        url,
        buffers.len(),
        images.len()
    );

    let document = gltf.document;
    let mut loader = GltfDocumentLoader::new(url, &document, &buffers, &images);
    loader.load()
}

#[cfg(test)]
pub(crate) mod test {
    use std::{future::ready, sync::Arc};

    use base64::{engine::general_purpose::STANDARD, Engine};
    use glam::Vec3;
    use serde_json::json;

    use super::{load_gltf, GltfLoaderError};
    use crate::{
        bounds::BoundingBox,
        index::{AssetIndex, ResourceType},
        loader::{
            source::{AssetSource, MemorySource, NotFound},
            texture::test::png_bytes,
        },
    };

    pub(crate) fn triangle_bytes() -> Vec<u8> {
        [
            [0.0f32, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
        .iter()
        .flatten()
        .flat_map(|value| value.to_le_bytes())
        .collect()
    }

    /// A triangle moved one unit along X, with a textured material.
    pub(crate) fn triangle_gltf(buffer_uri: &str) -> Vec<u8> {
        json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "name": "root", "nodes": [0] }],
            "nodes": [{ "mesh": 0, "translation": [1.0, 0.0, 0.0] }],
            "meshes": [{
                "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
            }],
            "materials": [{
                "pbrMetallicRoughness": {
                    "baseColorTexture": { "index": 0 },
                    "metallicRoughnessTexture": { "index": 0 }
                }
            }],
            "textures": [{ "source": 0 }],
            "images": [{ "uri": "texture.png" }],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            }],
            "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
            "buffers": [{ "uri": buffer_uri, "byteLength": 36 }]
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn load_with_external_resources() {
        let source = MemorySource::new()
            .with("https://x/models/triangle.bin", triangle_bytes())
            .with("https://x/models/texture.png", png_bytes());
        let url = "https://x/models/triangle.gltf";
        let source = &source;

        let node = pollster::block_on(load_gltf(
            url,
            &triangle_gltf("triangle.bin"),
            |url: String| async move { source.fetch(&url).await },
        ))
        .unwrap();

        assert_eq!(node.name.as_deref(), Some("root"));
        assert_eq!(node.mesh_count(), 1);
        assert_eq!(
            node.bounding_box(),
            BoundingBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 0.0))
        );

        let mut primitives = Vec::new();
        node.for_each_primitive(&mut |primitive| primitives.push(primitive.clone()));
        let material = &primitives[0].material;
        let color = material.map.as_ref().unwrap();
        assert_eq!(
            color.id,
            AssetIndex::UrlTypeIndex(url.to_string(), ResourceType::Texture, 0)
        );
        assert_eq!(color.size, (2, 3));
        assert!(Arc::ptr_eq(
            material.metalness_map.as_ref().unwrap(),
            material.roughness_map.as_ref().unwrap()
        ));
        assert_eq!(
            primitives[0].geometry.id,
            AssetIndex::UrlTypeIndex(url.to_string(), ResourceType::Geometry, 0)
        );
    }

    #[test]
    fn data_uri_buffer() {
        let source = MemorySource::new().with("texture.png", png_bytes());
        let buffer_uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(triangle_bytes())
        );

        let source = &source;

        let node = pollster::block_on(load_gltf(
            "triangle.gltf",
            &triangle_gltf(&buffer_uri),
            |url: String| async move { source.fetch(&url).await },
        ))
        .unwrap();
        assert_eq!(node.bounding_box().max, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn missing_resource_is_io_error() {
        let source = &MemorySource::new();
        let result = pollster::block_on(load_gltf(
            "https://x/triangle.gltf",
            &triangle_gltf("triangle.bin"),
            |url: String| async move { source.fetch(&url).await },
        ));
        match result {
            Err(GltfLoaderError::Io(NotFound(url))) => assert_eq!(url, "https://x/triangle.bin"),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn node_cycle_is_rejected() {
        let gltf = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "children": [1] }, { "children": [2] }, { "children": [1] }]
        })
        .to_string();
        let result = pollster::block_on(load_gltf("loop.gltf", gltf.as_bytes(), |_url: String| {
            ready(Ok::<_, NotFound>(Vec::new()))
        }));
        assert!(matches!(result, Err(GltfLoaderError::NodeCycle(1))));
    }

    #[test]
    fn bad_json_is_gltf_error() {
        let result = pollster::block_on(load_gltf("a.gltf", b"{", |_url: String| {
            ready(Ok::<_, NotFound>(Vec::new()))
        }));
        assert!(matches!(result, Err(GltfLoaderError::Gltf(_))));
    }
}
