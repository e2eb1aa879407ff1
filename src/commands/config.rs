use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    http::HttpClient,
    package::{CatalogDocument, PackageRecord},
    runtime::Runtime,
    source::{FileCatalogSource, HttpCatalogSource, SourceId, SourceRegistry},
};

/// Environment variable holding a bearer token for catalog requests.
pub const TOKEN_ENV: &str = "SDKCAT_TOKEN";

/// Options collected from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOptions {
    /// Explicit config file; must exist when given.
    pub config: Option<PathBuf>,
    /// Installed inventory, overriding the config file.
    pub installed: Option<PathBuf>,
    /// Extra catalog URLs or paths.
    pub sources: Vec<String>,
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub installed: Option<PathBuf>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
}

pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub http_client: HttpClient,
    pub registry: SourceRegistry,
    pub installed: Option<PathBuf>,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn new(runtime: R, options: ConfigOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var(TOKEN_ENV) {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using {} for authentication", TOKEN_ENV);
        }

        let client = Client::builder()
            .user_agent("sdkcat-cli")
            .default_headers(headers)
            .build()?;
        let http_client = HttpClient::new(client);

        let file = load_config_file(&runtime, options.config.as_deref())?;
        let runtime = Arc::new(runtime);

        let mut registry = SourceRegistry::new();
        let entries = file.sources.iter().cloned().chain(
            options
                .sources
                .iter()
                .map(|url| SourceEntry { name: None, url: url.clone() }),
        );
        for entry in entries {
            let id = source_id(&entry);
            if is_remote(&entry.url) {
                registry.register(Arc::new(HttpCatalogSource::new(http_client.clone(), id)));
            } else {
                let path = PathBuf::from(&entry.url);
                registry.register(Arc::new(FileCatalogSource::new(runtime.clone(), path, id)));
            }
        }
        debug!("Configured {} source(s)", registry.len());

        Ok(Self {
            runtime,
            http_client,
            registry,
            installed: options.installed.or(file.installed),
        })
    }

    /// Read the installed inventory. No inventory means nothing is installed.
    #[tracing::instrument(skip(self))]
    pub fn installed_packages(&self) -> Result<Vec<PackageRecord>> {
        let Some(path) = &self.installed else {
            info!("No installed inventory configured");
            return Ok(Vec::new());
        };

        let json = self.runtime.read_to_string(path)?;
        CatalogDocument::parse(&json)
            .and_then(|doc| doc.installed_records(|url| self.registry.resolve(url)))
            .with_context(|| format!("Invalid installed inventory {}", path.display()))
    }
}

fn load_config_file<R: Runtime>(runtime: &R, explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path(runtime) {
            Some(path) if runtime.exists(&path) => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(ConfigFile::default());
            }
        },
    };

    info!("Using config file: {}", path.display());
    let json = runtime.read_to_string(&path)?;
    serde_json::from_str(&json).with_context(|| format!("Invalid config file {}", path.display()))
}

/// `<config_dir>/sdkcat/config.json`
pub fn default_config_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
    runtime
        .config_dir()
        .map(|dir| dir.join("sdkcat").join("config.json"))
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn source_id(entry: &SourceEntry) -> SourceId {
    match &entry.name {
        Some(name) => SourceId::new(&entry.url, name),
        None if is_remote(&entry.url) => SourceId::from_url(&entry.url),
        None => {
            let stem = Path::new(&entry.url)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            SourceId::new(&entry.url, stem)
        }
    }
}
