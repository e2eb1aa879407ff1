//! HTTP catalog source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;
use crate::package::{CatalogDocument, PackageRecord};

use super::{CatalogSource, SourceId};

/// Catalog served as a JSON snapshot over HTTP(S).
pub struct HttpCatalogSource {
    http_client: HttpClient,
    id: SourceId,
}

impl HttpCatalogSource {
    pub fn new(http_client: HttpClient, id: SourceId) -> Self {
        Self { http_client, id }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    #[tracing::instrument(skip(self), fields(source = %self.id))]
    async fn fetch_packages(&self) -> Result<Vec<PackageRecord>> {
        let doc: CatalogDocument = self
            .http_client
            .get_json(self.id.url())
            .await
            .with_context(|| format!("Failed to fetch catalog {}", self.id))?;

        debug!("Fetched {} package(s) from {}", doc.packages.len(), self.id);

        doc.remote_records(&self.id)
    }
}
