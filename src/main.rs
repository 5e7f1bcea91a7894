//! Storefront Harvester main entry point
//!
//! This is the command-line interface for scraping simple products from one
//! storefront.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use storefront_harvester::config::{load_config_from_env, load_config_with_hash};
use storefront_harvester::output::write_json;
use storefront_harvester::Scraper;
use tracing_subscriber::EnvFilter;

/// Storefront Harvester: simple-product scraper for arbitrary storefronts
///
/// Discovers product pages on a WooCommerce, Shopify, Magento, Wix or custom
/// site, keeps only single-SKU products, and prints them as JSON. Grouped,
/// bundle and configurable products are ignored.
#[derive(Parser, Debug)]
#[command(name = "storefront-harvester")]
#[command(version)]
#[command(about = "Scrape simple products from a storefront", long_about = None)]
struct Cli {
    /// Site URL to scrape (a bare host is treated as https://)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Collaborator API base URL for progress updates and item delivery
    #[arg(long, value_name = "URL")]
    api_base_url: Option<String>,

    /// Bearer token for the collaborator API
    #[arg(long, env = "AGENT_TOKEN", hide_env_values = true)]
    agent_token: Option<String>,

    /// Write the JSON records to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Never launch a browser, even for script-rendered sites
    #[arg(long)]
    no_render: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let url = cli.url.trim();
    if url.is_empty() {
        anyhow::bail!("No URL provided");
    }

    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            tracing::info!("Loaded configuration from {}", path.display());
            tracing::debug!("Config hash: {}", hash);
            config
        }
        None => load_config_from_env().context("Invalid environment configuration")?,
    };

    if cli.no_render {
        config.render.enabled = false;
    }

    let scraper = Scraper::new(config).context("Failed to initialize HTTP clients")?;

    tracing::info!("Starting scrape for: {}", url);
    let records = scraper
        .scrape_site(url, cli.api_base_url.as_deref(), cli.agent_token.as_deref())
        .await;

    write_json(&records, cli.output.as_deref()).context("Failed to write results")?;

    Ok(())
}

/// Sets up logging based on verbosity level
///
/// Logs go to stderr so stdout carries only the JSON records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storefront_harvester=info,warn"),
            1 => EnvFilter::new("storefront_harvester=debug,info"),
            2 => EnvFilter::new("storefront_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
