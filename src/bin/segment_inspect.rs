use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pet_profiles::config;
use pet_profiles::shopify::ShopifyClient;

#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Segment search query, e.g. `name:'Pet owners'`
    #[arg(long)]
    query: Option<String>,

    #[arg(long, default_value = "50")]
    first: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = config::load(Some(&args.config))?;
    cfg.apply_env();
    let client = ShopifyClient::from_config(&cfg)?;

    let segments = client
        .list_segments(args.query.as_deref(), args.first.min(250))
        .await?;
    println!("Segments:");
    for segment in segments {
        println!("  {} -> {{ id: {} }}", segment.name, segment.id);
    }
    Ok(())
}
