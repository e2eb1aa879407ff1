//! JSON snapshot format shared by catalogs and the installed inventory.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::{PackageKey, PackageRecord, Revision};
use crate::source::SourceId;

/// Package type tag in a snapshot entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    Tool,
    PlatformTool,
    Platform,
    Addon,
    Extra,
}

/// One package entry as written in a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageEntry {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub revision: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Platform version name, e.g. `android-3`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL of the catalog an installed package came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A full package snapshot: a remote catalog or the installed inventory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

impl CatalogDocument {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse package snapshot")
    }

    /// Convert every entry into a record attributed to `source`.
    pub fn remote_records(&self, source: &SourceId) -> Result<Vec<PackageRecord>> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.to_record(Some(source.clone())).with_context(|| entry_context(i)))
            .collect()
    }

    /// Convert every entry into an installed record, resolving each entry's
    /// `source` URL with `resolve`.
    pub fn installed_records<F>(&self, resolve: F) -> Result<Vec<PackageRecord>>
    where
        F: Fn(&str) -> SourceId,
    {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let source = entry.source.as_deref().map(&resolve);
                entry.to_record(source).with_context(|| entry_context(i))
            })
            .collect()
    }
}

fn entry_context(index: usize) -> String {
    format!("Invalid package entry #{}", index + 1)
}

impl PackageEntry {
    pub fn to_record(&self, source: Option<SourceId>) -> Result<PackageRecord> {
        if self.revision == 0 {
            bail!("revision must be a positive integer");
        }

        let key = match self.kind {
            EntryType::Tool => PackageKey::Tool,
            EntryType::PlatformTool => PackageKey::PlatformTool,
            EntryType::Platform => PackageKey::Platform {
                api_level: self.require_api_level()?,
            },
            EntryType::Addon => PackageKey::Addon {
                api_level: self.require_api_level()?,
                vendor: require(&self.vendor, "vendor")?,
                name: require(&self.name, "name")?,
            },
            EntryType::Extra => PackageKey::Extra {
                vendor: require(&self.vendor, "vendor")?,
                path: require(&self.path, "path")?,
            },
        };

        let label = match &self.description {
            Some(description) if !description.trim().is_empty() => description.clone(),
            _ => key.default_label(self.version.as_deref()),
        };

        Ok(PackageRecord {
            key,
            revision: Revision(self.revision),
            source,
            label,
            version_name: self.version.clone(),
        })
    }

    fn require_api_level(&self) -> Result<u32> {
        self.api_level
            .with_context(|| format!("{:?} entry is missing 'api_level'", self.kind))
    }
}

fn require(field: &Option<String>, name: &str) -> Result<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => bail!("missing '{}'", name),
    }
}
