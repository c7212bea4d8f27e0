use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetData,
    symbol::{DerivativeQuality, DerivativeUsage},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivativeData {
    #[serde(default)]
    pub usage: DerivativeUsage,
    #[serde(default)]
    pub quality: DerivativeQuality,
    #[serde(default)]
    pub assets: Vec<AssetData>,
}

impl DerivativeData {
    pub fn new(usage: DerivativeUsage, quality: DerivativeQuality) -> Self {
        Self {
            usage,
            quality,
            assets: Vec::new(),
        }
    }
}
