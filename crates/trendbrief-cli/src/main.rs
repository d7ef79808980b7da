//! Orchestration binary for the weekly trend brief pipeline.

mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "trendbrief-cli")]
#[command(about = "Weekly trend-brief pipeline: collect, diff, assemble, persist")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the weekly pipeline end to end
    Run(run::RunArgs),
    /// List stored snapshot dates, newest first
    Snapshots,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = trendbrief_core::load_app_config_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::run_pipeline(config, args).await,
        Commands::Snapshots => run::list_snapshots(&config),
    }
}
