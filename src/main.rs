use anyhow::Result;
use clap::Parser;
use sdkcat::commands::{ConfigOptions, ListOptions, list, sources};
use std::path::PathBuf;

/// sdkcat - SDK package catalog
///
/// Compare installed SDK packages against one or more remote catalogs and
/// show what is installed, what can be updated, and what is new.
///
/// If the SDKCAT_TOKEN environment variable is set, it is sent as a bearer
/// token with every catalog request.
///
/// Examples:
///   sdkcat list                       # Group packages by API level
///   sdkcat list --by-source --updates # Pending updates, grouped by source
#[derive(Parser, Debug)]
#[command(author, version = env!("SDKCAT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/sdkcat/config.json; also via SDKCAT_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "SDKCAT_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// Installed package inventory (overrides the config file)
    #[arg(long = "installed", short = 'i', value_name = "PATH", global = true)]
    pub installed: Option<PathBuf>,

    /// Additional catalog URL or file (repeatable)
    #[arg(long = "source", short = 's', value_name = "URL", global = true)]
    pub sources: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List installed and available packages
    List(ListArgs),

    /// Show configured catalog sources
    Sources,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Group packages by source instead of API level
    #[arg(long)]
    pub by_source: bool,

    /// Only show packages with an update available
    #[arg(long)]
    pub updates: bool,

    /// Print JSON instead of a tree
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            config: self.config.clone(),
            installed: self.installed.clone(),
            sources: self.sources.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = sdkcat::runtime::RealRuntime;
    let config_options = cli.config_options();

    match cli.command {
        Commands::List(args) => {
            let options = ListOptions {
                by_source: args.by_source,
                updates: args.updates,
                json: args.json,
            };
            list(runtime, config_options, options).await?
        }
        Commands::Sources => sources(runtime, config_options)?,
    }
    Ok(())
}
