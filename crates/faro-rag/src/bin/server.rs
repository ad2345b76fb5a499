//! Query server binary
//!
//! Run with: cargo run -p faro-rag --bin faro-rag-server

use faro_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faro_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: explicit file wins, environment otherwise
    let config = match std::env::var("FARO_RAG_CONFIG") {
        Ok(path) => RagConfig::from_file(&path)?,
        Err(_) => RagConfig::from_env(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings engine: {}", config.embeddings.service_url);
    tracing::info!("  - Primary search: {} ({})", config.search.url, config.search.collection);
    tracing::info!(
        "  - Shadow search: {}",
        if config.shadow.database_url.is_some() { "enabled" } else { "disabled" }
    );
    tracing::info!("  - LLM model: {}", config.llm.model);

    let server = RagServer::new(config)?;

    // Best-effort startup pings; the service still starts if they fail
    if !server.state().embedder().health_check().await.unwrap_or(false) {
        tracing::warn!("Embeddings engine not reachable yet; /query will fail until it is");
    }
    if !server.state().primary_searcher().health_check().await.unwrap_or(false) {
        tracing::warn!("Primary search backend not reachable yet; /query will fail until it is");
    }

    println!("\nServer starting...");
    println!("  Health:  http://{}/health", server.address());
    println!("  Ready:   http://{}/ready", server.address());
    println!("  Metrics: http://{}/metrics", server.address());
    println!("\nEndpoints:");
    println!("  POST /query - Ask questions");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
