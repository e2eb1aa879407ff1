pub mod config;
mod list;
mod sources;

pub use config::{Config, ConfigOptions};
pub use list::{ListOptions, list, reconcile};
pub use sources::sources;
