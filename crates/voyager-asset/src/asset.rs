use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use voyager_document::{AssetData, AssetType, MapType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    EmptyUri,
}

impl Display for InvalidArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::EmptyUri => write!(f, "Asset URI must not be empty"),
        }
    }
}

impl Error for InvalidArgument {}

/// Reference to a single file a derivative is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asset {
    data: AssetData,
}

impl Asset {
    pub fn new(uri: impl Into<String>, asset_type: AssetType, map_type: Option<MapType>) -> Self {
        Self {
            data: AssetData {
                uri: uri.into(),
                asset_type,
                map_type,
                ..Default::default()
            },
        }
    }

    pub fn from_data(data: AssetData) -> Self {
        Self { data }
    }

    pub fn to_data(&self) -> AssetData {
        self.data.clone()
    }

    pub fn data(&self) -> &AssetData {
        &self.data
    }

    pub fn uri(&self) -> &str {
        &self.data.uri
    }

    pub fn asset_type(&self) -> AssetType {
        self.data.asset_type
    }

    /// Only meaningful for image and texture assets.
    pub fn map_type(&self) -> Option<MapType> {
        self.data.map_type
    }

    pub fn is_texture(&self) -> bool {
        matches!(self.data.asset_type, AssetType::Image | AssetType::Texture)
    }
}
