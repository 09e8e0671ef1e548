use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use pet_profiles::config;
use pet_profiles::shopify::ShopifyClient;
use pet_profiles::submission::ProfileUpdate;

#[derive(Debug, Parser)]
#[command(author, version, about = "Write one customer's pet profile metafields")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Customer id, numeric or `gid://shopify/Customer/...`
    #[arg(long)]
    customer: String,

    #[arg(long)]
    pet_type: Option<String>,

    #[arg(long)]
    stress_level: Option<String>,

    #[arg(long)]
    drug_usage: Option<String>,

    #[arg(long)]
    pet_age: Option<String>,

    #[arg(long)]
    pet_weight: Option<String>,
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

    let update = ProfileUpdate {
        pet_type: args.pet_type,
        stress_level: args.stress_level,
        drug_usage: args.drug_usage,
        pet_age: args.pet_age,
        pet_weight: args.pet_weight,
    };

    let client = ShopifyClient::from_config(&cfg)?;
    match client
        .set_profile(&cfg.shopify.metafield_namespace, &args.customer, &update)
        .await
    {
        Ok(receipt) => {
            let keys: Vec<&str> = receipt.written.iter().map(|f| f.key()).collect();
            println!("Updated customer {}: {}", receipt.customer_id, keys.join(", "));
            Ok(())
        }
        Err(err) => {
            error!(%err, "profile submission failed");
            Err(err.into())
        }
    }
}
