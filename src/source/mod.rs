//! Catalog sources.
//!
//! A source is a remote (or file-backed) catalog listing the packages it can
//! provide. This module provides the source identity used as a partition key
//! by the reconciliation engine and the fetch abstraction used by commands.

mod file;
mod http;
mod registry;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::package::PackageRecord;

pub use file::FileCatalogSource;
pub use http::HttpCatalogSource;
pub use registry::SourceRegistry;

/// Identity of a catalog source.
///
/// Equality and hashing use the URL only, so two instances describing the
/// same catalog are interchangeable map keys.
#[derive(Debug, Clone, Serialize)]
pub struct SourceId {
    url: String,
    name: String,
    #[serde(skip)]
    host: String,
}

impl SourceId {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            host: host_of(&url),
            url,
            name: name.into(),
        }
    }

    /// Create an id named after the URL's host.
    pub fn from_url(url: &str) -> Self {
        Self::new(url, host_of(url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Display name, falling back to the URL when blank.
    pub fn name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    /// Host of the URL (no scheme, port, path or credentials). Empty for
    /// file paths and anything else without a host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Order used to sort source categories: name, then host, then URL.
    pub fn display_cmp(&self, other: &SourceId) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.host().cmp(other.host()))
            .then_with(|| self.url.cmp(&other.url))
    }
}

impl PartialEq for SourceId {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for SourceId {}

impl Hash for SourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host();
        if host.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} ({})", self.name(), host)
        }
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.host_str()
                .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
        })
        .unwrap_or_default()
}

/// A catalog that can produce a full snapshot of the packages it offers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Identity used to attribute fetched packages.
    fn id(&self) -> &SourceId;

    /// Fetch the complete current package list.
    async fn fetch_packages(&self) -> Result<Vec<PackageRecord>>;
}
