use anyhow::Result;

use crate::{runtime::Runtime, source::SourceRegistry};

use super::config::{Config, ConfigOptions};

/// Show configured catalog sources
#[tracing::instrument(skip(runtime, config_options))]
pub fn sources<R: Runtime + 'static>(runtime: R, config_options: ConfigOptions) -> Result<()> {
    let config = Config::new(runtime, config_options)?;
    print!("{}", render(&config.registry));
    Ok(())
}

fn render(registry: &SourceRegistry) -> String {
    if registry.is_empty() {
        return "No sources configured.\n".to_string();
    }
    registry
        .ids()
        .iter()
        .map(|id| format!("{}\t{}\n", id.name(), id.url()))
        .collect()
}
