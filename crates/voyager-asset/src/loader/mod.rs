use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

use image::ImageError;
use serde::{Deserialize, Serialize};

use crate::{geometry::GeometryAsset, node::NodeAsset, texture::TextureAsset};

use self::url::RootUrl;

pub mod asset_loader;
pub mod manager;
pub mod source;
pub mod url;
pub mod validate;

/// glTF and GLB model loader with `gltf` crate.
#[cfg(feature = "gltf")]
pub mod gltf;

/// OBJ geometry loader with `tobj` crate.
#[cfg(feature = "obj")]
pub mod obj;

pub(crate) mod texture;

#[cfg(feature = "obj")]
#[inline]
fn chunk_vec2(data: &[f32]) -> Vec<[f32; 2]> {
    data.chunks_exact(2).map(|item| [item[0], item[1]]).collect()
}

#[cfg(feature = "obj")]
#[inline]
fn chunk_vec3(data: &[f32]) -> Vec<[f32; 3]> {
    data.chunks_exact(3)
        .map(|item| [item[0], item[1], item[2]])
        .collect()
}

/// Loads the files a [`Derivative`](crate::derivative::Derivative) is built
/// from. Paths are relative to whatever root the implementation resolves
/// against.
#[allow(async_fn_in_trait)]
pub trait DerivativeLoader {
    type Error: Error;

    /// Loads a complete model with its own materials and textures.
    async fn load_model(&self, path: &str) -> Result<NodeAsset, Self::Error>;
    async fn load_geometry(&self, path: &str) -> Result<GeometryAsset, Self::Error>;
    async fn load_texture(&self, path: &str) -> Result<Arc<TextureAsset>, Self::Error>;
}

#[derive(Debug)]
pub enum LoadError<E> {
    Source(String, E),
    Json(String, serde_json::Error),
    DocumentValidation(String, String),
    #[cfg(feature = "gltf")]
    Gltf(String, gltf::GltfLoaderError<E>),
    #[cfg(feature = "obj")]
    Obj(String, obj::ObjLoadError),
    Image(String, ImageError),
    Unsupported(String, &'static str),
}

impl<E> LoadError<E> {
    pub fn url(&self) -> &str {
        match self {
            LoadError::Source(url, _)
            | LoadError::Json(url, _)
            | LoadError::DocumentValidation(url, _)
            | LoadError::Image(url, _)
            | LoadError::Unsupported(url, _) => url,
            #[cfg(feature = "gltf")]
            LoadError::Gltf(url, _) => url,
            #[cfg(feature = "obj")]
            LoadError::Obj(url, _) => url,
        }
    }
}

impl<E: Display> Display for LoadError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Source(url, error) => write!(f, "Failed to fetch {}: {}", url, error),
            LoadError::Json(url, error) => write!(f, "Bad JSON in {}: {}", url, error),
            LoadError::DocumentValidation(url, message) => {
                write!(f, "Document {} failed validation: {}", url, message)
            }
            #[cfg(feature = "gltf")]
            LoadError::Gltf(url, error) => write!(f, "Bad model {}: {}", url, error),
            #[cfg(feature = "obj")]
            LoadError::Obj(url, error) => write!(f, "Bad geometry {}: {}", url, error),
            LoadError::Image(url, error) => write!(f, "Bad image {}: {}", url, error),
            LoadError::Unsupported(url, kind) => write!(f, "Unsupported {}: {}", kind, url),
        }
    }
}

impl<E: Error> Error for LoadError<E> {}

/// Where relative asset paths are resolved from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetLoaderConfig {
    /// Location of the page or document the viewer was started from.
    pub location: String,
    /// Explicit root. Takes precedence over `location`.
    pub root_url: Option<String>,
}

impl Default for AssetLoaderConfig {
    fn default() -> Self {
        Self {
            location: String::from("file:///"),
            root_url: None,
        }
    }
}

impl AssetLoaderConfig {
    pub fn root(&self) -> RootUrl {
        match &self.root_url {
            Some(root) => RootUrl::new(root),
            None => RootUrl::from_location(&self.location),
        }
    }
}

/// File extension of a URL, lowercased, without query or fragment.
pub(crate) fn extension(url: &str) -> Option<String> {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

#[cfg(test)]
mod test {
    use super::{extension, AssetLoaderConfig};

    #[test]
    fn config_root() {
        let config = AssetLoaderConfig::default();
        assert_eq!(config.root().as_str(), "file:///");

        let config: AssetLoaderConfig = serde_json::from_str(
            r#"{ "location": "https://3d.si.edu/object/index.html?id=1" }"#,
        )
        .unwrap();
        assert_eq!(config.root().as_str(), "https://3d.si.edu/object/");

        let config = AssetLoaderConfig {
            root_url: Some(String::from("https://cdn.example.org/voyager")),
            ..config
        };
        assert_eq!(config.root().as_str(), "https://cdn.example.org/voyager/");
    }

    #[test]
    fn extensions() {
        assert_eq!(extension("a/b/model.GLB").as_deref(), Some("glb"));
        assert_eq!(extension("https://x/y/mesh.obj?v=1#f").as_deref(), Some("obj"));
        assert_eq!(extension("https://x.org/y/mesh"), None);
    }
}
