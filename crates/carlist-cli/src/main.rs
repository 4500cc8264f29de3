mod export;
mod scrape;
mod summary;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "carlist-cli")]
#[command(about = "Used-car listing collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect listings (the default when no command is given)
    Scrape(ScrapeArgs),
    /// Write the CSV dataset from the saved checkpoint without scraping
    Export(ExportArgs),
    /// Print a summary of the saved checkpoint
    Stats,
}

#[derive(Debug, Default, Args)]
struct ScrapeArgs {
    /// Target record count; overrides CARLIST_TARGET_COUNT
    #[arg(long)]
    target: Option<usize>,
    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Debug, Default, Args)]
struct ExportArgs {
    /// Drop duplicate listings and round prices before writing
    #[arg(long)]
    dedup: bool,
    /// Output CSV path; defaults to car_data_<timestamp>.csv in CARLIST_OUTPUT_DIR
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = carlist_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape(args)) => scrape::run_scrape(config, &args).await,
        None => scrape::run_scrape(config, &ScrapeArgs::default()).await,
        Some(Commands::Export(args)) => export::run_export(&config, &args),
        Some(Commands::Stats) => {
            summary::run_stats(&config);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
