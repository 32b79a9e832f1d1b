//! Legal text store server binary
//!
//! Run with: cargo run --bin lex-store-server

use lex_store::config::AppConfig;
use lex_store::server::StoreServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lex_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.database.path.display());
    tracing::info!("  - Embedding model: {}", config.ollama.embed_model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Source: {}", config.scraper.base_url);

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.ollama.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.ollama.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.ollama.base_url);
            tracing::warn!("Embedding-backed endpoints will fail until it is up:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!("  2. Pull the model: ollama pull {}", config.ollama.embed_model);
        }
    }

    // Create and start server
    let server = StoreServer::new(config)?;

    println!("\nServer starting...");
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  GET  /legal-texts/gesetze-im-internet/codes        - List stored codes");
    println!("  GET  /legal-texts/gesetze-im-internet/:code        - Retrieve texts");
    println!("  GET  /legal-texts/gesetze-im-internet/:code/search - Semantic search");
    println!("  POST /legal-texts/gesetze-im-internet/:code        - Import a code");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
