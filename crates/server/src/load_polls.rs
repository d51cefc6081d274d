use std::env;

use anyhow::Context;
use chrono::Utc;
use polls::{config::Config, notify::LogNotifier, seed::load_polls, setup_log, store::PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_log();
    let config = Config::from_env()?;

    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;

    println!("Connected to database!");

    // Read polls from file
    let path = env::args().nth(1).unwrap_or_else(|| "polls.txt".to_string());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {path} - make sure it exists!"))?;

    let report = load_polls(&store, &LogNotifier, &content, Utc::now()).await?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new polls!", report.loaded);
    if report.skipped > 0 {
        println!("⊘ Skipped {} duplicate polls", report.skipped);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}
