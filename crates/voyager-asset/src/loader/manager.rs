use std::cell::Cell;

use log::{debug, trace};
use voyager_event::Listeners;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingProgress {
    pub url: String,
    pub loaded: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingFailure {
    pub url: String,
    /// Items still in flight after the failed one was accounted for.
    pub outstanding: usize,
}

/// Counts in-flight loads and reports when a batch starts and finishes.
///
/// A batch starts with the first item while idle and completes once every
/// started item has either ended or failed. Counters reset with each batch.
#[derive(Debug, Default)]
pub struct LoadingManager {
    loaded: Cell<usize>,
    total: Cell<usize>,
    loading: Cell<bool>,
    pub on_start: Listeners<LoadingProgress>,
    pub on_progress: Listeners<LoadingProgress>,
    pub on_complete: Listeners<()>,
    pub on_error: Listeners<LoadingFailure>,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn loaded(&self) -> usize {
        self.loaded.get()
    }

    pub fn total(&self) -> usize {
        self.total.get()
    }

    pub fn outstanding(&self) -> usize {
        self.total.get() - self.loaded.get()
    }

    pub fn item_start(&self, url: &str) {
        if !self.loading.get() {
            self.loaded.set(0);
            self.total.set(0);
        }
        self.total.set(self.total.get() + 1);
        trace!("Start {} ({}/{})", url, self.loaded.get(), self.total.get());

        if !self.loading.get() {
            self.loading.set(true);
            debug!("Loading started with {}", url);
            self.on_start.emit(&self.progress(url));
        }
    }

    pub fn item_end(&self, url: &str) {
        self.finish(url);
    }

    pub fn item_error(&self, url: &str) {
        self.on_error.emit(&LoadingFailure {
            url: url.to_string(),
            outstanding: self.outstanding().saturating_sub(1),
        });
        self.finish(url);
    }

    fn finish(&self, url: &str) {
        self.loaded.set(self.loaded.get() + 1);
        self.on_progress.emit(&self.progress(url));

        if self.loaded.get() >= self.total.get() && self.loading.get() {
            self.loading.set(false);
            debug!("Loading complete, {} items", self.total.get());
            self.on_complete.emit(&());
        }
    }

    fn progress(&self, url: &str) -> LoadingProgress {
        LoadingProgress {
            url: url.to_string(),
            loaded: self.loaded.get(),
            total: self.total.get(),
        }
    }
}
