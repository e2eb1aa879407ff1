use serde::Serialize;
use std::fmt;

use super::PackageKey;
use crate::source::SourceId;

/// Package revision. Higher is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Revision(pub u32);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Revision {
    fn from(value: u32) -> Self {
        Revision(value)
    }
}

/// One concrete package at one revision, as reported by a local scan or a
/// remote catalog.
///
/// `source` is `None` for installed packages whose origin is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub key: PackageKey,
    pub revision: Revision,
    pub source: Option<SourceId>,
    pub label: String,
    /// Platform version name such as `android-3`.
    pub version_name: Option<String>,
}

impl PackageRecord {
    pub fn new(key: PackageKey, revision: u32, source: Option<SourceId>) -> Self {
        let label = key.default_label(None);
        Self {
            key,
            revision: Revision(revision),
            source,
            label,
            version_name: None,
        }
    }

    pub fn tool(revision: u32, source: Option<SourceId>) -> Self {
        Self::new(PackageKey::Tool, revision, source)
    }

    pub fn platform_tool(revision: u32, source: Option<SourceId>) -> Self {
        Self::new(PackageKey::PlatformTool, revision, source)
    }

    pub fn platform(
        api_level: u32,
        version_name: &str,
        revision: u32,
        source: Option<SourceId>,
    ) -> Self {
        let key = PackageKey::Platform { api_level };
        let label = key.default_label(Some(version_name));
        Self {
            key,
            revision: Revision(revision),
            source,
            label,
            version_name: Some(version_name.to_string()),
        }
    }

    pub fn addon(
        api_level: u32,
        vendor: &str,
        name: &str,
        revision: u32,
        source: Option<SourceId>,
    ) -> Self {
        Self::new(
            PackageKey::Addon {
                api_level,
                vendor: vendor.to_string(),
                name: name.to_string(),
            },
            revision,
            source,
        )
    }

    pub fn extra(vendor: &str, path: &str, revision: u32, source: Option<SourceId>) -> Self {
        Self::new(
            PackageKey::Extra {
                vendor: vendor.to_string(),
                path: path.to_string(),
            },
            revision,
            source,
        )
    }

    /// Replace the generated label with an explicit description.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, revision {}", self.label, self.revision)
    }
}
