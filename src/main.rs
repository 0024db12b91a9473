//! Connection check: verifies the configured token against the Cloudflare
//! API and prints the user, the first zones, and the account id.

use anyhow::{Context, Result};
use serde_json::Value;

use cf_monitor::{AppConfig, CloudflareClient, QueryParams};

#[tokio::main]
async fn main() -> Result<()> {
    cf_monitor::config::load_dotenv()?;
    let config = AppConfig::from_env();

    if config.client.token.is_none() {
        eprintln!("No Cloudflare API token found.");
        eprintln!("Set CF_API_TOKEN or create cf_token.txt in the working directory.");
        std::process::exit(1);
    }

    let client = CloudflareClient::new(config.client).context("Failed to build HTTP client")?;
    println!("Token found, checking API connection...");

    println!("\n1. User info");
    let user = client.user_info().await.context("Failed to fetch user info")?;
    println!(
        "  Email: {}",
        user.pointer("/result/email")
            .and_then(Value::as_str)
            .unwrap_or("N/A")
    );

    println!("\n2. Zones");
    let zones = client
        .zones(QueryParams::new())
        .await
        .context("Failed to list zones")?;
    let list = zones
        .get("result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let count = zones
        .pointer("/result_info/count")
        .and_then(Value::as_u64)
        .unwrap_or(list.len() as u64);
    println!("  {} zone(s)", count);
    for (i, zone) in list.iter().take(3).enumerate() {
        println!(
            "  {}. {} (ID: {})",
            i + 1,
            zone.get("name").and_then(Value::as_str).unwrap_or("?"),
            zone.get("id").and_then(Value::as_str).unwrap_or("?")
        );
    }

    println!("\n3. Account ID");
    match client.resolve_account_id().await {
        Ok(id) => println!("  {}", id),
        Err(e) => println!("  Not available: {}", e),
    }

    println!("\nConnection check complete");
    Ok(())
}
