mod listing;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cnfeed_scraper::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cnfeed-cli")]
#[command(about = "Export coches.net dealer listings as JSON, NDJSON or CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a dealer page and export its listings
    Fetch {
        /// Dealer slug, expanded to `{base}/concesionario/{slug}/`
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        dealer: Option<String>,

        /// Absolute listing URL to fetch instead of a slug
        #[arg(long)]
        url: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Export listings from a saved dealer page
    Parse {
        /// Path to the saved HTML document
        html_file: PathBuf,

        /// Origin for resolving relative links (defaults to `CNFEED_BASE_URL`)
        #[arg(long)]
        base: Option<String>,

        /// URL reported in the JSON envelope (defaults to the file path)
        #[arg(long)]
        source_url: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Rendering options shared by every subcommand.
#[derive(Debug, clap::Args)]
struct OutputArgs {
    /// json (flattened, enveloped), jsonl (raw records) or csv (flattened)
    #[arg(long, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cnfeed_core::load_app_config()?;

    // stdout carries the export; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            dealer,
            url,
            output,
        } => listing::run_fetch(&config, dealer.as_deref(), url.as_deref(), &output).await,
        Commands::Parse {
            html_file,
            base,
            source_url,
            output,
        } => {
            let base = base.unwrap_or_else(|| config.base_url.clone());
            listing::run_parse(&html_file, &base, source_url.as_deref(), &output).await
        }
    }
}

#[cfg(test)]
mod tests;
