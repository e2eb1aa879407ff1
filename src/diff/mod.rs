//! Reconciliation engine
//!
//! Merges the installed packages and the packages offered by each catalog
//! source into one de-duplicated view, grouped into display categories.
//!
//! Callers drive it through a [`DiffSession`]: open an update, submit one full
//! batch per source (the installed batch uses `None`), then end the update.
//! Every call reports whether the visible result changed.

mod category;
mod error;
mod item;
mod ledger;
mod projection;
mod session;

pub use category::{Category, CategoryKey, CategorySet, LOCAL_PACKAGES_LABEL, SortMode};
pub use error::UpdateError;
pub use item::{Available, ItemState, MergedItem};
pub use ledger::MergeLedger;
pub use projection::Projection;
pub use session::{DiffSession, UpdateOp};
