use std::{future::Future, rc::Rc, sync::Arc};

use log::{debug, info, warn};
use serde_json::Value;
use voyager_document::DocumentData;
use voyager_event::{ListenerId, Signal};

use crate::{geometry::GeometryAsset, index::AssetIndex, node::NodeAsset, texture::TextureAsset};

use super::{
    extension,
    manager::{LoadingFailure, LoadingManager},
    source::AssetSource,
    texture::decode_texture,
    url::RootUrl,
    validate::{DocumentValidator, SchemaValidator},
    AssetLoaderConfig, DerivativeLoader, LoadError,
};

/// Resolves asset paths against a root URL, fetches them from a source and
/// decodes them. Every load is tracked by the [`LoadingManager`], which in
/// turn drives the `loading` signal.
pub struct AssetLoader<S: AssetSource> {
    source: S,
    root: RootUrl,
    validator: Box<dyn DocumentValidator>,
    manager: Rc<LoadingManager>,
    loading: Rc<Signal<bool>>,
    subscriptions: [ListenerId; 3],
}

impl<S: AssetSource> AssetLoader<S> {
    pub fn new(source: S, root: RootUrl) -> Self {
        let manager = Rc::new(LoadingManager::new());
        let loading = Rc::new(Signal::new(false));

        let signal = loading.clone();
        let start = manager.on_start.subscribe(move |progress| {
            debug!("Loading {}", progress.url);
            signal.set(true);
        });
        let signal = loading.clone();
        let complete = manager.on_complete.subscribe(move |_| {
            signal.set(false);
        });
        let signal = loading.clone();
        let error = manager
            .on_error
            .subscribe(move |failure: &LoadingFailure| {
                debug!(
                    "Failed {}, {} loads outstanding",
                    failure.url, failure.outstanding
                );
                if failure.outstanding == 0 {
                    signal.set(false);
                }
            });

        info!("Asset root is {}", root);
        Self {
            source,
            root,
            validator: Box::new(SchemaValidator::default()),
            manager,
            loading,
            subscriptions: [start, complete, error],
        }
    }

    pub fn from_config(source: S, config: &AssetLoaderConfig) -> Self {
        Self::new(source, config.root())
    }

    pub fn root(&self) -> &RootUrl {
        &self.root
    }

    /// Absolute URL of an asset path.
    pub fn url(&self, path: &str) -> String {
        self.root.resolve(path)
    }

    /// True while any load is in flight.
    pub fn loading(&self) -> &Rc<Signal<bool>> {
        &self.loading
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn manager(&self) -> &Rc<LoadingManager> {
        &self.manager
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn set_validator(&mut self, validator: impl DocumentValidator + 'static) {
        self.validator = Box::new(validator);
    }

    async fn track<T>(
        &self,
        url: &str,
        load: impl Future<Output = Result<T, LoadError<S::Error>>>,
    ) -> Result<T, LoadError<S::Error>> {
        self.manager.item_start(url);
        let result = load.await;
        match &result {
            Ok(_) => self.manager.item_end(url),
            Err(error) => {
                warn!("{}", error);
                self.manager.item_error(url);
            }
        }
        result
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError<S::Error>> {
        self.source
            .fetch(url)
            .await
            .map_err(|error| LoadError::Source(url.to_string(), error))
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, LoadError<S::Error>> {
        let data = self.fetch(url).await?;
        serde_json::from_slice(&data).map_err(|error| LoadError::Json(url.to_string(), error))
    }

    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, self.fetch(&url)).await
    }

    pub async fn load_json(&self, path: &str) -> Result<Value, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, self.fetch_json(&url)).await
    }

    /// Loads and validates a document.
    pub async fn load_document(&self, path: &str) -> Result<DocumentData, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, async {
            let json = self.fetch_json(&url).await?;
            self.validator
                .validate(&json)
                .map_err(|message| LoadError::DocumentValidation(url.clone(), message))?;
            let document: DocumentData = serde_json::from_value(json)
                .map_err(|error| LoadError::Json(url.clone(), error))?;
            info!("Loaded document {} ({})", url, document.asset);
            Ok(document)
        })
        .await
    }

    /// Loads a glTF or GLB model. Its buffers and images are fetched from the
    /// same source, relative to the model.
    pub async fn load_model(&self, path: &str) -> Result<NodeAsset, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, async {
            let data = self.fetch(&url).await?;
            self.decode_model(&url, &data).await
        })
        .await
    }

    #[cfg(feature = "gltf")]
    async fn decode_model(&self, url: &str, data: &[u8]) -> Result<NodeAsset, LoadError<S::Error>> {
        let source = &self.source;
        super::gltf::load_gltf(url, data, |url: String| async move {
            source.fetch(&url).await
        })
        .await
        .map_err(|error| LoadError::Gltf(url.to_string(), error))
    }

    #[cfg(not(feature = "gltf"))]
    async fn decode_model(&self, url: &str, _data: &[u8]) -> Result<NodeAsset, LoadError<S::Error>> {
        Err(LoadError::Unsupported(url.to_string(), "model format"))
    }

    /// Loads geometry without materials. Only Wavefront OBJ is supported.
    pub async fn load_geometry(&self, path: &str) -> Result<GeometryAsset, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, async {
            match extension(&url).as_deref() {
                #[cfg(feature = "obj")]
                Some("obj") => {
                    let data = self.fetch(&url).await?;
                    super::obj::load_obj_geometry(AssetIndex::Url(url.clone()), &data)
                        .map_err(|error| LoadError::Obj(url.clone(), error))
                }
                _ => Err(LoadError::Unsupported(url.clone(), "geometry format")),
            }
        })
        .await
    }

    pub async fn load_texture(&self, path: &str) -> Result<Arc<TextureAsset>, LoadError<S::Error>> {
        let url = self.url(path);
        self.track(&url, async {
            let data = self.fetch(&url).await?;
            let texture = decode_texture(AssetIndex::Url(url.clone()), &data)
                .map_err(|error| LoadError::Image(url.clone(), error))?;
            debug!("Texture {} is {}x{}", url, texture.size.0, texture.size.1);
            Ok(Arc::new(texture))
        })
        .await
    }
}

impl<S: AssetSource> DerivativeLoader for AssetLoader<S> {
    type Error = LoadError<S::Error>;

    async fn load_model(&self, path: &str) -> Result<NodeAsset, Self::Error> {
        AssetLoader::load_model(self, path).await
    }

    async fn load_geometry(&self, path: &str) -> Result<GeometryAsset, Self::Error> {
        AssetLoader::load_geometry(self, path).await
    }

    async fn load_texture(&self, path: &str) -> Result<Arc<TextureAsset>, Self::Error> {
        AssetLoader::load_texture(self, path).await
    }
}

impl<S: AssetSource> Drop for AssetLoader<S> {
    fn drop(&mut self) {
        let [start, complete, error] = self.subscriptions;
        self.manager.on_start.unsubscribe(start);
        self.manager.on_complete.unsubscribe(complete);
        self.manager.on_error.unsubscribe(error);
    }
}

#[cfg(all(test, feature = "gltf", feature = "obj"))]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use glam::Vec3;
    use serde_json::Value;
    use voyager_document::{AssetType, DerivativeQuality, DerivativeUsage, MapType};

    use super::AssetLoader;
    use crate::{
        bounds::BoundingBox,
        derivative::{test::CountingRelease, Derivative},
        index::AssetIndex,
        loader::{
            gltf::test::{triangle_bytes, triangle_gltf},
            obj::test::QUAD,
            source::{MemorySource, NotFound},
            texture::test::png_bytes,
            url::RootUrl,
            LoadError,
        },
    };

    const DOCUMENT: &str = r#"{
        "asset": { "type": "application/si-dpo-3d.document+json", "version": "1.0" },
        "items": [{ "derivatives": [{ "usage": "Web", "quality": "High", "assets": [] }] }]
    }"#;

    fn loader() -> AssetLoader<MemorySource> {
        let source = MemorySource::new()
            .with("https://x/data/scene.json", DOCUMENT)
            .with("https://x/data/bad.json", r#"{ "items": [] }"#)
            .with("https://x/data/item/quad.obj", QUAD)
            .with("https://x/data/item/quad.png", png_bytes())
            .with("https://x/data/item/triangle.gltf", triangle_gltf("triangle.bin"))
            .with("https://x/data/item/triangle.bin", triangle_bytes())
            .with("https://x/data/item/texture.png", png_bytes());
        AssetLoader::new(source, RootUrl::from_location("https://x/data/index.html"))
    }

    fn record(loader: &AssetLoader<MemorySource>) -> Rc<RefCell<Vec<bool>>> {
        let states = Rc::new(RefCell::new(Vec::new()));
        let log = states.clone();
        loader
            .loading()
            .subscribe(move |loading| log.borrow_mut().push(*loading));
        states
    }

    #[test]
    fn geometry_derivative_through_loader() {
        let loader = loader();
        let states = record(&loader);

        let mut derivative = Derivative::new(DerivativeUsage::Web, DerivativeQuality::Medium);
        derivative
            .add_asset("quad.obj", AssetType::Geometry, None)
            .unwrap();
        derivative
            .add_asset("quad.png", AssetType::Image, Some(MapType::Color))
            .unwrap();
        pollster::block_on(derivative.load(&loader, "item")).unwrap();

        assert_eq!(
            derivative.bounding_box(),
            BoundingBox::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.0))
        );
        assert_eq!(*states.borrow(), vec![true, false, true, false]);
        assert!(!loader.is_loading());
    }

    #[test]
    fn texture_listed_twice_is_released_per_decode() {
        let loader = loader();
        let mut derivative = Derivative::new(DerivativeUsage::Web, DerivativeQuality::High);
        derivative
            .add_asset("quad.obj", AssetType::Geometry, None)
            .unwrap();
        derivative
            .add_asset("quad.png", AssetType::Image, Some(MapType::Occlusion))
            .unwrap();
        derivative
            .add_asset("quad.png", AssetType::Image, Some(MapType::MetallicRoughness))
            .unwrap();
        pollster::block_on(derivative.load(&loader, "item")).unwrap();

        let mut release = CountingRelease::default();
        derivative.dispose(&mut release);
        let texture = AssetIndex::from("https://x/data/item/quad.png");
        assert_eq!(release.textures, vec![texture.clone(), texture]);
        assert_eq!(release.geometries.len(), 1);
    }

    #[test]
    fn model_derivative_through_loader() {
        let loader = loader();
        let mut derivative = Derivative::new(DerivativeUsage::Web, DerivativeQuality::High);
        derivative
            .add_asset("triangle.gltf", AssetType::Model, None)
            .unwrap();
        pollster::block_on(derivative.load(&loader, "item/")).unwrap();
        assert_eq!(derivative.bounding_box().min, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn documents_are_validated() {
        let loader = loader();
        let document = pollster::block_on(loader.load_document("scene.json")).unwrap();
        assert_eq!(document.items[0].derivatives[0].quality, DerivativeQuality::High);

        let result = pollster::block_on(loader.load_document("bad.json"));
        assert!(matches!(
            result,
            Err(LoadError::DocumentValidation(url, message))
                if url == "https://x/data/bad.json" && message == "/asset is missing"
        ));
    }

    #[test]
    fn custom_validator() {
        let mut loader = loader();
        loader.set_validator(|_: &Value| -> Result<(), String> { Err(String::from("rejected")) });
        let result = pollster::block_on(loader.load_document("scene.json"));
        assert!(matches!(result, Err(LoadError::DocumentValidation(_, message)) if message == "rejected"));
    }

    #[test]
    fn failure_resets_loading_signal() {
        let loader = loader();
        let states = record(&loader);

        let result = pollster::block_on(loader.load_texture("item/missing.png"));
        match result {
            Err(LoadError::Source(url, NotFound(missing))) => {
                assert_eq!(url, "https://x/data/item/missing.png");
                assert_eq!(missing, url);
            }
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
        assert_eq!(*states.borrow(), vec![true, false]);
        assert!(!loader.manager().is_loading());
    }

    #[test]
    fn unsupported_geometry() {
        let loader = loader();
        let result = pollster::block_on(loader.load_geometry("item/scan.ply"));
        assert!(matches!(result, Err(LoadError::Unsupported(_, "geometry format"))));
        assert!(!loader.is_loading());
    }

    #[test]
    fn json_and_bytes() {
        let loader = loader();
        let json = pollster::block_on(loader.load_json("/data/scene.json")).unwrap();
        assert_eq!(json["asset"]["version"], "1.0");
        let bytes = pollster::block_on(loader.load_bytes("https://x/data/item/quad.obj")).unwrap();
        assert_eq!(bytes, QUAD.as_bytes());
        assert!(matches!(
            pollster::block_on(loader.load_json("item/quad.obj")),
            Err(LoadError::Json(_, _))
        ));
    }
}
