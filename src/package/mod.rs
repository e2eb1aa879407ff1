//! Package model
//!
//! This module provides the revision-independent package identity, the
//! immutable package records fed into the reconciliation engine, and the JSON
//! snapshot format used by catalogs and the installed inventory.

mod key;
mod manifest;
mod record;

pub use key::{PackageKey, Tier};
pub use manifest::{CatalogDocument, EntryType, PackageEntry};
pub use record::{PackageRecord, Revision};
