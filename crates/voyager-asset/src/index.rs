use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    Geometry,
    Texture,
    Material,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Geometry => write!(f, "Geometry"),
            ResourceType::Texture => write!(f, "Texture"),
            ResourceType::Material => write!(f, "Material"),
        }
    }
}

/// Identity of a loaded resource, derived from where it was loaded from.
///
/// Two resources with the same index are the same GPU resource as far as
/// release is concerned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetIndex {
    /// A whole file, e.g. an OBJ geometry or a JPEG texture.
    Url(String),
    /// A resource embedded in a container file, e.g. the third image of a GLB.
    UrlTypeIndex(String, ResourceType, usize),
}

impl AssetIndex {
    pub fn url(&self) -> &str {
        match self {
            AssetIndex::Url(url) => url,
            AssetIndex::UrlTypeIndex(url, _, _) => url,
        }
    }
}

impl From<&str> for AssetIndex {
    fn from(url: &str) -> Self {
        AssetIndex::Url(url.to_string())
    }
}

impl From<String> for AssetIndex {
    fn from(url: String) -> Self {
        AssetIndex::Url(url)
    }
}

impl Display for AssetIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetIndex::Url(url) => Display::fmt(url, f),
            AssetIndex::UrlTypeIndex(url, resource_type, index) => {
                write!(f, "{} - {}: {}", url, resource_type, index)
            }
        }
    }
}
