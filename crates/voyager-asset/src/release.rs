use std::{collections::HashSet, sync::Arc};

use log::trace;

use crate::{geometry::GeometryAsset, node::NodeAsset, texture::TextureAsset};

/// GPU side of loaded resources. Implemented by the renderer, which frees
/// the buffers and textures it uploaded for the given asset.
pub trait ResourceRelease {
    fn release_geometry(&mut self, geometry: &GeometryAsset);
    fn release_texture(&mut self, texture: &TextureAsset);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseCount {
    pub geometries: usize,
    pub textures: usize,
}

/// Releases every geometry and texture referenced by `node` once.
///
/// Resources are told apart by allocation, not by [`AssetIndex`]: a texture
/// shared between slots or materials is released a single time, while two
/// decodes of the same file are released separately.
///
/// [`AssetIndex`]: crate::index::AssetIndex
pub fn release_node<R: ResourceRelease + ?Sized>(node: &NodeAsset, release: &mut R) -> ReleaseCount {
    let mut geometries: HashSet<*const GeometryAsset> = HashSet::new();
    let mut textures: HashSet<*const TextureAsset> = HashSet::new();

    node.for_each_primitive(&mut |primitive| {
        if geometries.insert(Arc::as_ptr(&primitive.geometry)) {
            trace!("Release geometry {}", primitive.geometry.id);
            release.release_geometry(&primitive.geometry);
        }
        for (slot, texture) in primitive.material.maps() {
            if textures.insert(Arc::as_ptr(texture)) {
                trace!("Release {:?} texture {}", slot, texture.id);
                release.release_texture(texture);
            }
        }
    });

    ReleaseCount {
        geometries: geometries.len(),
        textures: textures.len(),
    }
}
