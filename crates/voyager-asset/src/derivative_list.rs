use uuid::Uuid;
use voyager_document::{DerivativeData, DerivativeQuality, DerivativeUsage};

use crate::{derivative::Derivative, release::ResourceRelease};

/// Derivatives of a single item, in document order.
#[derive(Debug, Default)]
pub struct DerivativeList {
    derivatives: Vec<Derivative>,
}

impl DerivativeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: Vec<DerivativeData>) -> Self {
        Self {
            derivatives: data.into_iter().map(Derivative::from_data).collect(),
        }
    }

    pub fn to_data(&self) -> Vec<DerivativeData> {
        self.derivatives.iter().map(Derivative::to_data).collect()
    }

    pub fn len(&self) -> usize {
        self.derivatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.derivatives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Derivative> {
        self.derivatives.iter()
    }

    pub fn add(&mut self, derivative: Derivative) -> &mut Derivative {
        self.derivatives.push(derivative);
        let index = self.derivatives.len() - 1;
        &mut self.derivatives[index]
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.derivatives
            .iter()
            .position(|derivative| derivative.id == id)
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<&Derivative> {
        self.derivatives
            .iter()
            .find(|derivative| derivative.id == id)
    }

    pub fn get_by_id_mut(&mut self, id: Uuid) -> Option<&mut Derivative> {
        self.derivatives
            .iter_mut()
            .find(|derivative| derivative.id == id)
    }

    /// Derivative with exactly this usage and quality.
    pub fn get(&self, usage: DerivativeUsage, quality: DerivativeQuality) -> Option<&Derivative> {
        self.derivatives
            .iter()
            .find(|derivative| derivative.usage() == usage && derivative.quality() == quality)
    }

    pub fn get_or_create(
        &mut self,
        usage: DerivativeUsage,
        quality: DerivativeQuality,
    ) -> &mut Derivative {
        let found = self
            .derivatives
            .iter()
            .position(|derivative| derivative.usage() == usage && derivative.quality() == quality);
        match found {
            Some(index) => &mut self.derivatives[index],
            None => self.add(Derivative::new(usage, quality)),
        }
    }

    /// Removes a derivative and releases whatever it has loaded.
    pub fn remove<R: ResourceRelease + ?Sized>(&mut self, id: Uuid, release: &mut R) -> bool {
        match self.take(id) {
            Some(mut derivative) => {
                derivative.dispose(release);
                true
            }
            None => false,
        }
    }

    /// Removes a derivative without disposing it, e.g. to load it while the
    /// list stays borrowable.
    pub fn take(&mut self, id: Uuid) -> Option<Derivative> {
        let index = self.position(id)?;
        Some(self.derivatives.remove(index))
    }

    /// Puts a derivative back at `index`, clamped to the list length.
    pub fn insert(&mut self, index: usize, derivative: Derivative) {
        let index = index.min(self.derivatives.len());
        self.derivatives.insert(index, derivative);
    }

    /// Index of the best match for the requested usage and quality.
    ///
    /// An exact match wins. Otherwise the nearest lower quality is taken,
    /// then the nearest higher one. Qualities outside the Thumb to Highest
    /// range only match exactly.
    pub fn select_index(&self, usage: DerivativeUsage, quality: DerivativeQuality) -> Option<usize> {
        let find = |quality: DerivativeQuality| {
            self.derivatives
                .iter()
                .position(|derivative| derivative.usage() == usage && derivative.quality() == quality)
        };

        if let Some(index) = find(quality) {
            return Some(index);
        }

        let position = quality.ladder_position()?;
        let ladder = DerivativeQuality::LADDER;
        ladder[..position]
            .iter()
            .rev()
            .chain(ladder[position + 1..].iter())
            .find_map(|quality| find(*quality))
    }

    pub fn select(&self, usage: DerivativeUsage, quality: DerivativeQuality) -> Option<&Derivative> {
        self.select_index(usage, quality)
            .map(|index| &self.derivatives[index])
    }

    pub fn dispose<R: ResourceRelease + ?Sized>(&mut self, release: &mut R) {
        for derivative in &mut self.derivatives {
            derivative.dispose(release);
        }
    }
}
