//! Grounded RAG server binary
//!
//! Run with: cargo run -p grounded-rag --bin grounded-rag-server

use grounded_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Grounded RAG Server                    ║
║         Answers from your documents, with sources         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Index directory: {}", config.index.persist_dir.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Grounding model: {}", config.grounding.model);
    tracing::info!(
        "  - Styling: {}",
        if config.styling.enabled { config.styling.model.as_str() } else { "disabled" }
    );
    tracing::info!("  - Default top_k: {}", config.retrieval.default_top_k);

    let server = RagServer::new(config).await;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Ready: http://{}/ready", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/query - Ask questions");
    println!("  GET  /api/info  - Service information");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
