//! Source registry for managing the configured catalog sources.

use std::sync::Arc;

use log::debug;

use super::{CatalogSource, SourceId};

/// Registry of catalog sources.
///
/// The registry allows:
/// - Registering sources (a source with an equal id replaces the old one)
/// - Listing sources in display order
/// - Resolving the source an installed package came from
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source.
    ///
    /// If a source with the same id is already registered, it will be replaced.
    pub fn register(&mut self, source: Arc<dyn CatalogSource>) {
        if let Some(existing) = self.sources.iter_mut().find(|s| s.id() == source.id()) {
            debug!("Replacing source {}", source.id());
            *existing = source;
        } else {
            self.sources.push(source);
        }
    }

    /// Get a registered source by URL.
    pub fn get(&self, url: &str) -> Option<&Arc<dyn CatalogSource>> {
        self.sources.iter().find(|s| s.id().url() == url)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// All sources, sorted by display order.
    pub fn sources(&self) -> Vec<Arc<dyn CatalogSource>> {
        let mut sources = self.sources.clone();
        sources.sort_by(|a, b| a.id().display_cmp(b.id()));
        sources
    }

    /// Ids of all sources, sorted by display order.
    pub fn ids(&self) -> Vec<SourceId> {
        self.sources().iter().map(|s| s.id().clone()).collect()
    }

    /// Resolve the id for a catalog URL recorded on an installed package.
    ///
    /// Unregistered URLs still get an id, named after their host.
    pub fn resolve(&self, url: &str) -> SourceId {
        match self.get(url) {
            Some(source) => source.id().clone(),
            None => {
                debug!("Installed package refers to unregistered source {}", url);
                SourceId::from_url(url)
            }
        }
    }
}
