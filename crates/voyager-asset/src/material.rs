use std::sync::Arc;

use voyager_document::MapType;

use crate::texture::TextureAsset;

/// Texture slots of [`PbrMaterial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSlot {
    Color,
    Occlusion,
    Emissive,
    Metalness,
    Roughness,
    Normal,
}

impl MapSlot {
    pub const ALL: [MapSlot; 6] = [
        MapSlot::Color,
        MapSlot::Occlusion,
        MapSlot::Emissive,
        MapSlot::Metalness,
        MapSlot::Roughness,
        MapSlot::Normal,
    ];

    /// Slots a texture of the given map type is assigned to. A packed
    /// metallic-roughness texture feeds two slots.
    pub fn for_map_type(map_type: MapType) -> &'static [MapSlot] {
        match map_type {
            MapType::Color => &[MapSlot::Color],
            MapType::Occlusion => &[MapSlot::Occlusion],
            MapType::Emissive => &[MapSlot::Emissive],
            MapType::MetallicRoughness => &[MapSlot::Metalness, MapSlot::Roughness],
            MapType::Normal => &[MapSlot::Normal],
            MapType::Zone => &[],
        }
    }
}

/// Shading used when a mesh ends up without a color map.
pub const FALLBACK_COLOR: [f32; 4] = [192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0, 1.0];
pub const FALLBACK_ROUGHNESS: f32 = 0.8;
pub const FALLBACK_METALNESS: f32 = 0.0;

/// Metallic-roughness material.
#[derive(Debug, Clone)]
pub struct PbrMaterial {
    pub name: Option<String>,
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub double_sided: bool,
    pub map: Option<Arc<TextureAsset>>,
    pub ao_map: Option<Arc<TextureAsset>>,
    pub emissive_map: Option<Arc<TextureAsset>>,
    pub metalness_map: Option<Arc<TextureAsset>>,
    pub roughness_map: Option<Arc<TextureAsset>>,
    pub normal_map: Option<Arc<TextureAsset>>,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            name: None,
            color: [1.0, 1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            double_sided: false,
            map: None,
            ao_map: None,
            emissive_map: None,
            metalness_map: None,
            roughness_map: None,
            normal_map: None,
        }
    }
}

impl PbrMaterial {
    pub fn slot(&self, slot: MapSlot) -> Option<&Arc<TextureAsset>> {
        match slot {
            MapSlot::Color => self.map.as_ref(),
            MapSlot::Occlusion => self.ao_map.as_ref(),
            MapSlot::Emissive => self.emissive_map.as_ref(),
            MapSlot::Metalness => self.metalness_map.as_ref(),
            MapSlot::Roughness => self.roughness_map.as_ref(),
            MapSlot::Normal => self.normal_map.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: MapSlot) -> &mut Option<Arc<TextureAsset>> {
        match slot {
            MapSlot::Color => &mut self.map,
            MapSlot::Occlusion => &mut self.ao_map,
            MapSlot::Emissive => &mut self.emissive_map,
            MapSlot::Metalness => &mut self.metalness_map,
            MapSlot::Roughness => &mut self.roughness_map,
            MapSlot::Normal => &mut self.normal_map,
        }
    }

    /// Present maps in slot order. A texture assigned to two slots shows
    /// up twice.
    pub fn maps(&self) -> impl Iterator<Item = (MapSlot, &Arc<TextureAsset>)> {
        MapSlot::ALL
            .into_iter()
            .filter_map(|slot| self.slot(slot).map(|texture| (slot, texture)))
    }

    /// Returns false if the map type has no slot on this material.
    pub fn assign_map(&mut self, map_type: MapType, texture: Arc<TextureAsset>) -> bool {
        let slots = MapSlot::for_map_type(map_type);
        for slot in slots {
            *self.slot_mut(*slot) = Some(texture.clone());
        }
        if map_type == MapType::Emissive {
            // Emissive maps are modulated by the emissive color.
            self.emissive = [1.0, 1.0, 1.0];
        }
        !slots.is_empty()
    }

    pub fn apply_fallback_shading(&mut self) {
        self.color = FALLBACK_COLOR;
        self.roughness = FALLBACK_ROUGHNESS;
        self.metalness = FALLBACK_METALNESS;
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use voyager_document::MapType;

    use super::{MapSlot, PbrMaterial};
    use crate::texture::TextureAsset;

    #[test]
    fn metallic_roughness_fills_both_slots() {
        let texture = Arc::new(TextureAsset::solid("orm.png".into(), [0, 128, 255, 255]));
        let mut material = PbrMaterial::default();

        assert!(material.assign_map(MapType::MetallicRoughness, texture.clone()));
        assert!(Arc::ptr_eq(material.slot(MapSlot::Metalness).unwrap(), &texture));
        assert!(Arc::ptr_eq(material.slot(MapSlot::Roughness).unwrap(), &texture));
        assert_eq!(material.maps().count(), 2);
        assert!(material.map.is_none());
    }

    #[test]
    fn zone_maps_have_no_slot() {
        let texture = Arc::new(TextureAsset::solid("zones.png".into(), [0; 4]));
        let mut material = PbrMaterial::default();
        assert!(!material.assign_map(MapType::Zone, texture));
        assert_eq!(material.maps().count(), 0);
    }
}
