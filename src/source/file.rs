//! File-backed catalog source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::package::{CatalogDocument, PackageRecord};
use crate::runtime::Runtime;

use super::{CatalogSource, SourceId};

/// Catalog snapshot stored on disk, read through [`Runtime`].
pub struct FileCatalogSource<R: Runtime> {
    runtime: Arc<R>,
    path: PathBuf,
    id: SourceId,
}

impl<R: Runtime> FileCatalogSource<R> {
    pub fn new(runtime: Arc<R>, path: PathBuf, id: SourceId) -> Self {
        Self { runtime, path, id }
    }
}

#[async_trait]
impl<R: Runtime> CatalogSource for FileCatalogSource<R> {
    fn id(&self) -> &SourceId {
        &self.id
    }

    #[tracing::instrument(skip(self), fields(source = %self.id))]
    async fn fetch_packages(&self) -> Result<Vec<PackageRecord>> {
        let json = self.runtime.read_to_string(&self.path)?;
        let records = CatalogDocument::parse(&json)
            .and_then(|doc| doc.remote_records(&self.id))
            .with_context(|| format!("Invalid catalog {}", self.path.display()))?;

        debug!("Read {} package(s) from {:?}", records.len(), self.path);
        Ok(records)
    }
}
