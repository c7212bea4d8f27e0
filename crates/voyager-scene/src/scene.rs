use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use log::{debug, warn};
use voyager_asset::{
    bounds::BoundingBox, loader::DerivativeLoader, release::ResourceRelease,
};
use voyager_document::{
    AssetInfo, DerivativeQuality, DerivativeUsage, DocumentData, UnitType,
};
use voyager_event::{ListenerId, Listeners};

use crate::model::{Model, ModelError, DEFAULT_UNITS};

#[derive(Debug)]
struct SceneState {
    units: Cell<UnitType>,
    models: RefCell<Vec<(Rc<Model>, ListenerId)>>,
    bounding_box: Cell<BoundingBox>,
    on_changed: Listeners<BoundingBox>,
}

impl SceneState {
    fn update(&self) {
        let units = self.units.get();
        let bounding_box = self
            .models
            .borrow()
            .iter()
            .map(|(model, _)| model.world_bounding_box(units))
            .fold(BoundingBox::EMPTY, |union, bounds| union.union(&bounds));

        if self.bounding_box.replace(bounding_box) != bounding_box {
            debug!("Scene bounds {:?}", bounding_box);
        }
        self.on_changed.emit(&bounding_box);
    }
}

/// The set of models making up a document, with the union of their bounds
/// in scene units.
///
/// The union is recomputed as models are added or removed, as the scene
/// units change and as any member reports new bounds. Subscribers are
/// notified after every recomputation, even when the union stays the same.
#[derive(Debug)]
pub struct Scene {
    state: Rc<SceneState>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_UNITS)
    }
}

impl Scene {
    pub fn new(units: UnitType) -> Self {
        Self {
            state: Rc::new(SceneState {
                units: Cell::new(units),
                models: RefCell::new(Vec::new()),
                bounding_box: Cell::new(BoundingBox::EMPTY),
                on_changed: Listeners::new(),
            }),
        }
    }

    pub fn from_data(data: &DocumentData) -> Self {
        let scene = Self::new(data.units.unwrap_or(DEFAULT_UNITS));
        for item in &data.items {
            scene.add_model(Rc::new(Model::from_data(item.clone())));
        }
        scene
    }

    pub fn to_data(&self) -> DocumentData {
        DocumentData {
            asset: AssetInfo::current(),
            units: Some(self.units()),
            items: self
                .state
                .models
                .borrow()
                .iter()
                .map(|(model, _)| model.to_data())
                .collect(),
        }
    }

    pub fn units(&self) -> UnitType {
        self.state.units.get()
    }

    pub fn set_units(&self, units: UnitType) {
        if self.state.units.replace(units) != units {
            self.state.update();
        }
    }

    /// Union of all model bounds in scene units. Empty without models or
    /// when nothing is loaded.
    pub fn bounding_box(&self) -> BoundingBox {
        self.state.bounding_box.get()
    }

    pub fn models(&self) -> Vec<Rc<Model>> {
        self.state
            .models
            .borrow()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.models.borrow().is_empty()
    }

    pub fn subscribe(&self, listener: impl Fn(&BoundingBox) + 'static) -> ListenerId {
        self.state.on_changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.state.on_changed.unsubscribe(id)
    }

    pub fn add_model(&self, model: Rc<Model>) {
        let state = Rc::downgrade(&self.state);
        let id = model.subscribe(move |_| {
            if let Some(state) = Weak::upgrade(&state) {
                state.update();
            }
        });
        self.state.models.borrow_mut().push((model, id));
        self.state.update();
    }

    /// Returns false if the model is not part of the scene.
    pub fn remove_model(&self, model: &Rc<Model>) -> bool {
        let removed = {
            let mut models = self.state.models.borrow_mut();
            let Some(index) = models
                .iter()
                .position(|(member, _)| Rc::ptr_eq(member, model))
            else {
                return false;
            };
            models.remove(index)
        };
        removed.0.unsubscribe(removed.1);
        self.state.update();
        true
    }

    /// Loads the matching derivative of every model in turn. Models without
    /// one or failing to load are logged and left as they are.
    ///
    /// Returns the number of models loaded.
    pub async fn load_models<L, R>(
        &self,
        loader: &L,
        base_path: &str,
        usage: DerivativeUsage,
        quality: DerivativeQuality,
        release: &mut R,
    ) -> usize
    where
        L: DerivativeLoader,
        R: ResourceRelease + ?Sized,
    {
        let mut loaded = 0;
        for model in self.models() {
            match model.load(loader, base_path, usage, quality, release).await {
                Ok(_) => loaded += 1,
                Err(ModelError::NoDerivative(usage, quality)) => {
                    debug!(
                        "Model {} has no {}/{} derivative",
                        model.name().unwrap_or_default(),
                        usage,
                        quality
                    );
                }
                Err(error) => {
                    warn!(
                        "Failed to load model {}: {}",
                        model.name().unwrap_or_default(),
                        error
                    );
                }
            }
        }
        loaded
    }

    pub fn dispose<R: ResourceRelease + ?Sized>(&self, release: &mut R) {
        for model in self.models() {
            model.dispose(release);
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for (model, id) in self.state.models.borrow().iter() {
            model.unsubscribe(*id);
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use glam::{Mat4, Vec3};
    use voyager_asset::bounds::BoundingBox;
    use voyager_document::{
        AssetInfo, DerivativeQuality, DerivativeUsage, DocumentData, UnitType,
    };

    use super::Scene;
    use crate::model::{
        test::{item, Released, SizedLoader},
        Model,
    };

    fn loaded_model(size: f32) -> Rc<Model> {
        let model = Rc::new(Model::from_data(item(&[(
            DerivativeQuality::High,
            format!("{}.obj", size).as_str(),
        )])));
        pollster::block_on(model.load(
            &SizedLoader,
            "",
            DerivativeUsage::Web,
            DerivativeQuality::High,
            &mut Released::default(),
        ))
        .unwrap();
        model
    }

    #[test]
    fn bounds_follow_membership() {
        let scene = Scene::new(UnitType::Centimeter);
        assert!(scene.bounding_box().is_empty());

        let small = loaded_model(1.0);
        scene.add_model(small.clone());
        assert_eq!(scene.bounding_box(), small.bounding_box());

        let large = loaded_model(3.0);
        large.set_transform(Mat4::from_translation(Vec3::splat(-1.0)));
        scene.add_model(large.clone());
        assert_eq!(
            scene.bounding_box(),
            BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(2.0))
        );

        assert!(scene.remove_model(&large));
        assert!(!scene.remove_model(&large));
        assert_eq!(scene.bounding_box(), small.bounding_box());

        assert!(scene.remove_model(&small));
        assert!(scene.bounding_box().is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn bounds_are_in_scene_units() {
        let scene = Scene::new(UnitType::Meter);
        let model = loaded_model(50.0);
        scene.add_model(model.clone());
        assert!((scene.bounding_box().max - Vec3::splat(0.5)).abs().max_element() < 1e-5);

        scene.set_units(UnitType::Millimeter);
        assert!((scene.bounding_box().max - Vec3::splat(500.0)).abs().max_element() < 1e-3);

        model.set_units(UnitType::Millimeter);
        assert!((scene.bounding_box().max - Vec3::splat(50.0)).abs().max_element() < 1e-3);
    }

    #[test]
    fn member_loads_update_bounds() {
        let mut data = DocumentData {
            asset: AssetInfo::current(),
            units: Some(UnitType::Centimeter),
            items: vec![
                item(&[(DerivativeQuality::Low, "1.obj"), (DerivativeQuality::High, "2.obj")]),
                item(&[(DerivativeQuality::High, "missing.obj")]),
                item(&[]),
            ],
        };
        data.items[0].name = Some(String::from("first"));
        let scene = Scene::from_data(&data);
        assert_eq!(scene.len(), 3);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        scene.subscribe(move |bounds| log.borrow_mut().push(bounds.max));

        let mut released = Released::default();
        let loaded = pollster::block_on(scene.load_models(
            &SizedLoader,
            "",
            DerivativeUsage::Web,
            DerivativeQuality::Low,
            &mut released,
        ));
        assert_eq!(loaded, 1);

        let loaded = pollster::block_on(scene.load_models(
            &SizedLoader,
            "",
            DerivativeUsage::Web,
            DerivativeQuality::High,
            &mut released,
        ));
        assert_eq!(loaded, 1);
        assert_eq!(released.0, vec!["1.obj"]);
        assert_eq!(*seen.borrow(), vec![Vec3::ONE, Vec3::splat(2.0)]);

        scene.dispose(&mut released);
        assert!(scene.bounding_box().is_empty());
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(scene.to_data().items, data.items);
    }

    #[test]
    fn membership_changes_notify_without_bounds() {
        let scene = Scene::default();
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        scene.subscribe(move |bounds| {
            assert!(bounds.is_empty());
            *counter.borrow_mut() += 1;
        });

        let model = Rc::new(Model::default());
        scene.add_model(model.clone());
        assert_eq!(*count.borrow(), 1);
        assert!(scene.remove_model(&model));
        assert_eq!(*count.borrow(), 2);

        scene.set_units(UnitType::Meter);
        assert_eq!(*count.borrow(), 3);
        // Same units, nothing recomputed.
        scene.set_units(UnitType::Meter);
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn dropped_scene_releases_model_listeners() {
        let model = loaded_model(1.0);
        {
            let scene = Scene::default();
            scene.add_model(model.clone());
            assert_eq!(scene.units(), UnitType::Centimeter);
        }
        // Emits to nobody.
        model.set_transform(Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(model.world_bounding_box(UnitType::Centimeter).max, Vec3::splat(2.0));
    }
}
