use serde::{Deserialize, Serialize};

use crate::{derivative::DerivativeData, symbol::UnitType, version::AssetInfo};

/// One 3D item and the derivatives it can be displayed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitType>,
    /// Column-major 4x4 matrix placing the item in the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub derivatives: Vec<DerivativeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub asset: AssetInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitType>,
    #[serde(default)]
    pub items: Vec<ItemData>,
}
