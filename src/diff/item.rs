use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

use crate::package::{PackageKey, Revision};
use crate::source::SourceId;

/// Display state of a merged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemState {
    /// Installed, nothing newer offered.
    Installed,
    /// Installed, and a source offers a higher revision.
    UpdateAvailable,
    /// Offered by a source, not installed.
    New,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Installed => write!(f, "INSTALLED"),
            ItemState::UpdateAvailable => write!(f, "UPDATE"),
            ItemState::New => write!(f, "NEW"),
        }
    }
}

/// Best remote revision surfaced for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Available {
    pub revision: Revision,
    pub source: SourceId,
}

/// Reconciled state of one logical package.
///
/// `available` is only set when it is worth showing: the package is not
/// installed, or the offer is newer than the installed revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedItem {
    pub key: PackageKey,
    pub label: String,
    pub installed: Option<Revision>,
    pub available: Option<Available>,
    /// Source providing the best offer, else the installed package's origin.
    pub source: Option<SourceId>,
    pub version_name: Option<String>,
}

impl MergedItem {
    pub fn state(&self) -> ItemState {
        match (&self.installed, &self.available) {
            (Some(_), Some(_)) => ItemState::UpdateAvailable,
            (Some(_), None) => ItemState::Installed,
            (None, _) => ItemState::New,
        }
    }

    /// True when a source offers something newer than what is installed,
    /// including anything offered but not installed at all.
    pub fn has_update(&self) -> bool {
        self.available.is_some()
    }

    /// Revision shown first: the installed one, or the offered one.
    pub fn revision(&self) -> Option<Revision> {
        self.installed
            .or_else(|| self.available.as_ref().map(|a| a.revision))
    }
}

impl Serialize for MergedItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.version_name.is_some() { 7 } else { 6 };
        let mut s = serializer.serialize_struct("MergedItem", len)?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("label", &self.label)?;
        s.serialize_field("state", &self.state())?;
        s.serialize_field("installed", &self.installed)?;
        s.serialize_field("available", &self.available)?;
        s.serialize_field("source", &self.source)?;
        if let Some(version_name) = &self.version_name {
            s.serialize_field("version_name", version_name)?;
        }
        s.end()
    }
}

impl fmt::Display for MergedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}", self.state(), self.label)?;
        if let Some(revision) = self.revision() {
            write!(f, ", revision {}", revision)?;
        }
        if let (Some(_), Some(available)) = (&self.installed, &self.available) {
            write!(f, ", update: revision {}", available.revision)?;
        }
        write!(f, ">")
    }
}
