//! Persisted document format.
//!
//! A document lists items; every item carries the derivatives it can be
//! rendered with, and every derivative the assets it is built from.
//! Enumerations are stored by name, see [`symbol`].

pub mod asset;
pub mod derivative;
pub mod document;
pub mod symbol;
pub mod version;

pub use asset::AssetData;
pub use derivative::DerivativeData;
pub use document::{DocumentData, ItemData};
pub use symbol::{AssetType, DerivativeQuality, DerivativeUsage, MapType, UnitType};
pub use version::AssetInfo;

#[cfg(test)]
mod test {
    use super::*;

    const DOCUMENT: &str = r#"{
        "asset": { "type": "application/si-dpo-3d.document+json", "version": "1.0" },
        "units": "cm",
        "items": [{
            "name": "Mammoth",
            "units": "m",
            "derivatives": [{
                "usage": "Web",
                "quality": "Medium",
                "assets": [
                    { "uri": "mammoth.obj", "type": "Geometry", "numFaces": 150000 },
                    { "uri": "mammoth-diffuse.jpg", "type": "Image", "mapType": "Color" }
                ]
            }]
        }]
    }"#;

    #[test]
    fn parse_document() {
        let document: DocumentData = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(document.asset.major_version(), Some(1));
        assert_eq!(document.units, Some(UnitType::Centimeter));

        let item = &document.items[0];
        assert_eq!(item.units, Some(UnitType::Meter));
        let derivative = &item.derivatives[0];
        assert_eq!(derivative.usage, DerivativeUsage::Web);
        assert_eq!(derivative.quality, DerivativeQuality::Medium);
        assert_eq!(derivative.assets[0].asset_type, AssetType::Geometry);
        assert_eq!(derivative.assets[0].num_faces, Some(150000));
        assert_eq!(derivative.assets[1].map_type, Some(MapType::Color));
    }

    #[test]
    fn derivative_serializes_symbolic_names() {
        let mut data = DerivativeData::new(DerivativeUsage::Editorial, DerivativeQuality::High);
        data.assets
            .push(AssetData::new("model.glb", AssetType::Model));

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "usage": "Editorial",
                "quality": "High",
                "assets": [{ "uri": "model.glb", "type": "Model" }]
            })
        );
        let parsed: DerivativeData = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, data);
    }
}
