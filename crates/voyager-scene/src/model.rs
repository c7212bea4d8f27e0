use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;
use log::{debug, info};
use uuid::Uuid;
use voyager_asset::{
    bounds::BoundingBox,
    derivative::DerivativeError,
    derivative_list::DerivativeList,
    loader::DerivativeLoader,
    release::ResourceRelease,
};
use voyager_document::{DerivativeQuality, DerivativeUsage, ItemData, UnitType};
use voyager_event::{ListenerId, Listeners};

/// Units of items which do not state their own.
pub const DEFAULT_UNITS: UnitType = UnitType::Centimeter;

#[derive(Debug)]
pub enum ModelError<E> {
    NoDerivative(DerivativeUsage, DerivativeQuality),
    Derivative(DerivativeError<E>),
}

impl<E: Display> Display for ModelError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NoDerivative(usage, quality) => {
                write!(f, "No derivative for {} at {}", usage, quality)
            }
            ModelError::Derivative(error) => Display::fmt(error, f),
        }
    }
}

impl<E: Error> Error for ModelError<E> {}

impl<E> From<DerivativeError<E>> for ModelError<E> {
    fn from(value: DerivativeError<E>) -> Self {
        ModelError::Derivative(value)
    }
}

/// A scene item shown through one of its derivatives.
///
/// Whenever the bounds of the item change, because a derivative was loaded or
/// disposed or because the transform or units changed, the new local bounds
/// are sent to `on_bounds_changed` subscribers.
#[derive(Debug)]
pub struct Model {
    id: Option<String>,
    name: RefCell<Option<String>>,
    units: Cell<Option<UnitType>>,
    transform: Cell<Mat4>,
    derivatives: RefCell<DerivativeList>,
    active: Cell<Option<Uuid>>,
    bounding_box: Cell<BoundingBox>,
    on_bounds_changed: Listeners<BoundingBox>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DerivativeList::new())
    }
}

impl Model {
    pub fn new(derivatives: DerivativeList) -> Self {
        Self {
            id: None,
            name: RefCell::new(None),
            units: Cell::new(None),
            transform: Cell::new(Mat4::IDENTITY),
            derivatives: RefCell::new(derivatives),
            active: Cell::new(None),
            bounding_box: Cell::new(BoundingBox::EMPTY),
            on_bounds_changed: Listeners::new(),
        }
    }

    pub fn from_data(data: ItemData) -> Self {
        let model = Self::new(DerivativeList::from_data(data.derivatives));
        let transform = data
            .matrix
            .map_or(Mat4::IDENTITY, |matrix| Mat4::from_cols_array(&matrix));
        Self {
            id: data.id,
            name: RefCell::new(data.name),
            units: Cell::new(data.units),
            transform: Cell::new(transform),
            ..model
        }
    }

    pub fn to_data(&self) -> ItemData {
        let transform = self.transform.get();
        ItemData {
            id: self.id.clone(),
            name: self.name.borrow().clone(),
            units: self.units.get(),
            matrix: (transform != Mat4::IDENTITY).then(|| transform.to_cols_array()),
            derivatives: self.derivatives.borrow().to_data(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<String> {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        *self.name.borrow_mut() = name;
    }

    pub fn units(&self) -> UnitType {
        self.units.get().unwrap_or(DEFAULT_UNITS)
    }

    pub fn set_units(&self, units: UnitType) {
        if self.units.replace(Some(units)) != Some(units) {
            self.notify();
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.transform.get()
    }

    pub fn set_transform(&self, transform: Mat4) {
        if self.transform.replace(transform) != transform {
            self.notify();
        }
    }

    pub fn derivatives(&self) -> Ref<'_, DerivativeList> {
        self.derivatives.borrow()
    }

    /// Must not be held across a [`Model::load`].
    pub fn derivatives_mut(&self) -> RefMut<'_, DerivativeList> {
        self.derivatives.borrow_mut()
    }

    /// Id of the derivative currently shown.
    pub fn active_derivative(&self) -> Option<Uuid> {
        self.active.get()
    }

    /// Bounds of the shown derivative in model space.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box.get()
    }

    /// Bounds after applying the transform, in `units`.
    pub fn world_bounding_box(&self, units: UnitType) -> BoundingBox {
        self.bounding_box
            .get()
            .transform(&self.transform.get())
            .scale(self.units().scale_to(units))
    }

    pub fn subscribe(&self, listener: impl Fn(&BoundingBox) + 'static) -> ListenerId {
        self.on_bounds_changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.on_bounds_changed.unsubscribe(id)
    }

    fn notify(&self) {
        self.on_bounds_changed.emit(&self.bounding_box.get());
    }

    fn set_bounding_box(&self, bounding_box: BoundingBox) {
        self.bounding_box.set(bounding_box);
        self.notify();
    }

    /// Loads the derivative best matching `usage` and `quality` and shows it
    /// in place of the previous one, which is disposed.
    pub async fn load<L, R>(
        &self,
        loader: &L,
        base_path: &str,
        usage: DerivativeUsage,
        quality: DerivativeQuality,
        release: &mut R,
    ) -> Result<Uuid, ModelError<L::Error>>
    where
        L: DerivativeLoader,
        R: ResourceRelease + ?Sized,
    {
        let (index, id, loaded) = {
            let derivatives = self.derivatives.borrow();
            let index = derivatives
                .select_index(usage, quality)
                .ok_or(ModelError::NoDerivative(usage, quality))?;
            let derivative = derivatives
                .iter()
                .nth(index)
                .ok_or(ModelError::NoDerivative(usage, quality))?;
            (index, derivative.id, derivative.is_loaded())
        };
        if loaded && self.active.get() == Some(id) {
            debug!("Derivative {} already shown", id);
            return Ok(id);
        }

        // The list stays borrowable by others while the load is pending.
        let Some(mut derivative) = self.derivatives.borrow_mut().take(id) else {
            return Err(ModelError::NoDerivative(usage, quality));
        };
        info!(
            "Load {} derivative {}/{}",
            self.name().unwrap_or_default(),
            derivative.usage(),
            derivative.quality()
        );
        let result = derivative
            .load(loader, base_path)
            .await
            .map(|derivative| derivative.bounding_box());
        self.derivatives.borrow_mut().insert(index, derivative);
        let bounding_box = result?;

        if let Some(previous) = self.active.replace(Some(id)) {
            if previous != id {
                if let Some(previous) = self.derivatives.borrow_mut().get_by_id_mut(previous) {
                    previous.dispose(release);
                }
            }
        }
        self.set_bounding_box(bounding_box);
        Ok(id)
    }

    /// Disposes every derivative. The model shows nothing afterwards.
    pub fn dispose<R: ResourceRelease + ?Sized>(&self, release: &mut R) {
        self.derivatives.borrow_mut().dispose(release);
        self.active.set(None);
        if !self.bounding_box.get().is_empty() {
            self.set_bounding_box(BoundingBox::EMPTY);
        }
    }
}
