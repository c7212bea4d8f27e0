use serde::{Deserialize, Serialize};

use crate::symbol::{AssetType, MapType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetData {
    #[serde(default)]
    pub uri: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type: Option<MapType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_faces: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<u32>,
}

impl AssetData {
    pub fn new(uri: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            uri: uri.into(),
            asset_type,
            ..Default::default()
        }
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = Some(map_type);
        self
    }
}
