use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use futures::future::join_all;
use log::{debug, info, warn};
use uuid::Uuid;
use voyager_document::{AssetType, DerivativeData, DerivativeQuality, DerivativeUsage, MapType};

use crate::{
    asset::{Asset, InvalidArgument},
    bounds::BoundingBox,
    loader::{url::join_path, DerivativeLoader},
    material::PbrMaterial,
    mesh::MeshAsset,
    node::NodeAsset,
    release::{release_node, ResourceRelease},
};

#[derive(Debug)]
pub enum DerivativeError<E> {
    /// Neither a model nor a geometry asset to build from.
    MissingModelOrGeometry,
    Load(E),
}

impl<E: Display> Display for DerivativeError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DerivativeError::MissingModelOrGeometry => {
                write!(f, "Derivative has neither a model nor a geometry asset")
            }
            DerivativeError::Load(error) => Display::fmt(error, f),
        }
    }
}

impl<E: Error> Error for DerivativeError<E> {}

/// One usage and quality specific representation of an item.
#[derive(Debug)]
pub struct Derivative {
    pub id: Uuid,
    usage: DerivativeUsage,
    quality: DerivativeQuality,
    assets: Vec<Asset>,
    model: Option<NodeAsset>,
    bounding_box: BoundingBox,
}

impl Default for Derivative {
    fn default() -> Self {
        Self::new(DerivativeUsage::default(), DerivativeQuality::default())
    }
}

impl Derivative {
    pub fn new(usage: DerivativeUsage, quality: DerivativeQuality) -> Self {
        Self {
            id: Uuid::new_v4(),
            usage,
            quality,
            assets: Vec::new(),
            model: None,
            bounding_box: BoundingBox::EMPTY,
        }
    }

    pub fn from_data(data: DerivativeData) -> Self {
        let mut derivative = Self::new(data.usage, data.quality);
        derivative.assets = data.assets.into_iter().map(Asset::from_data).collect();
        derivative
    }

    pub fn to_data(&self) -> DerivativeData {
        DerivativeData {
            usage: self.usage,
            quality: self.quality,
            assets: self.assets.iter().map(Asset::to_data).collect(),
        }
    }

    pub fn usage(&self) -> DerivativeUsage {
        self.usage
    }

    pub fn quality(&self) -> DerivativeQuality {
        self.quality
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn model(&self) -> Option<&NodeAsset> {
        self.model.as_ref()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// First asset of the given type.
    pub fn find_asset(&self, asset_type: AssetType) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|asset| asset.asset_type() == asset_type)
    }

    pub fn add_asset(
        &mut self,
        uri: impl Into<String>,
        asset_type: AssetType,
        map_type: Option<MapType>,
    ) -> Result<&Asset, InvalidArgument> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(InvalidArgument::EmptyUri);
        }
        self.assets.push(Asset::new(uri, asset_type, map_type));
        Ok(&self.assets[self.assets.len() - 1])
    }

    /// Loads the renderable model of this derivative.
    ///
    /// A model asset is loaded as is and any other asset is ignored.
    /// Otherwise the geometry asset is combined with the image assets into a
    /// single mesh. Texture failures are logged and skipped.
    pub async fn load<L: DerivativeLoader>(
        &mut self,
        loader: &L,
        base_path: &str,
    ) -> Result<&mut Self, DerivativeError<L::Error>> {
        if self.model.is_some() {
            warn!(
                "Derivative {}/{} is already loaded",
                self.usage, self.quality
            );
            return Ok(self);
        }

        let model = if let Some(asset) = self.find_asset(AssetType::Model) {
            let path = join_path(base_path, asset.uri());
            info!("Load model {}", path);
            loader
                .load_model(&path)
                .await
                .map_err(DerivativeError::Load)?
        } else if let Some(asset) = self.find_asset(AssetType::Geometry) {
            let path = join_path(base_path, asset.uri());
            info!("Load geometry {}", path);
            let geometry = loader
                .load_geometry(&path)
                .await
                .map_err(DerivativeError::Load)?;
            debug!(
                "Geometry {} has {} vertices, bounds {:?}",
                path,
                geometry.vertex_count(),
                geometry.bounding_box()
            );

            let material = self.load_material(loader, base_path).await;
            let mesh = MeshAsset::new(Arc::new(geometry), Arc::new(material));
            NodeAsset::from_mesh(mesh)
        } else {
            return Err(DerivativeError::MissingModelOrGeometry);
        };

        self.bounding_box = model.bounding_box();
        self.model = Some(model);
        Ok(self)
    }

    /// Builds the material for a geometry asset out of all image assets.
    async fn load_material<L: DerivativeLoader>(&self, loader: &L, base_path: &str) -> PbrMaterial {
        let images: Vec<&Asset> = self
            .assets
            .iter()
            .filter(|asset| asset.asset_type() == AssetType::Image)
            .collect();

        let results = join_all(images.iter().map(|asset| async move {
            let path = join_path(base_path, asset.uri());
            let result = loader.load_texture(&path).await;
            (*asset, path, result)
        }))
        .await;

        let mut material = PbrMaterial::default();
        for (asset, path, result) in results {
            let texture = match result {
                Ok(texture) => texture,
                Err(error) => {
                    warn!("Failed to load texture {}: {}", path, error);
                    continue;
                }
            };
            let Some(map_type) = asset.map_type() else {
                warn!("Texture {} has no map type", path);
                continue;
            };
            if material.assign_map(map_type, texture) {
                debug!("Assigned {} map {}", map_type, path);
            } else {
                warn!("No material slot for {} map {}", map_type, path);
            }
        }

        if material.map.is_none() {
            material.apply_fallback_shading();
        }
        material
    }

    /// Releases everything the loaded model holds. The derivative can be
    /// loaded again afterwards.
    pub fn dispose<R: ResourceRelease + ?Sized>(&mut self, release: &mut R) {
        if let Some(model) = self.model.take() {
            let count = release_node(&model, release);
            debug!(
                "Disposed derivative {}/{}: {} geometries, {} textures",
                self.usage, self.quality, count.geometries, count.textures
            );
        }
        self.bounding_box = BoundingBox::EMPTY;
    }
}
