use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use pet_profiles::config;
use pet_profiles::report::{build_report, render_text};
use pet_profiles::shopify::{ProfilePages, ShopifyClient};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Collect customer pet profiles and print the dashboard report")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override `collector.cap` for this run
    #[arg(long)]
    cap: Option<usize>,

    /// Override `collector.page_size` for this run
    #[arg(long)]
    page_size: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    cfg.apply_env();

    let mut settings = cfg.collector.settings();
    if let Some(cap) = args.cap {
        settings.cap = Some(cap);
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }

    let client = ShopifyClient::from_config(&cfg)?;
    let pages = ProfilePages::from_config(client, &cfg);

    info!(cap = ?settings.cap, page_size = settings.page_size, "collecting pet profiles");
    let report = build_report(&pages, &settings, &cfg.dashboard).await;
    if let Some(err) = &report.error {
        error!(%err, "collection failed");
    }

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print!("{}", render_text(&report)),
    }

    if report.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
