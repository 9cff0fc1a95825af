//! Embedding Proxy Main
//!
//! Entry point for the embedding proxy HTTP server

use std::sync::Arc;

use embedding_proxy::{start_http_server, EmbeddingsClient, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::load("config.toml")?;
    config.validate()?;

    // Initialize tracing
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match config.monitoring.log_level.to_lowercase().as_str() {
            "trace" => "embedding_proxy=trace,trace".to_string(),
            "debug" => "embedding_proxy=debug,debug".to_string(),
            "info" => "embedding_proxy=info,info".to_string(),
            "warn" => "embedding_proxy=warn,warn".to_string(),
            "error" => "embedding_proxy=error,error".to_string(),
            _ => "embedding_proxy=info,info".to_string(),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .without_time()
        .init();

    println!("🚀 Embedding Proxy Server");
    println!("📊 Log Level: {}", config.monitoring.log_level);
    println!("===============================");

    // Build the upstream client
    let embeddings = EmbeddingsClient::new(&config.upstream)?;
    if !embeddings.is_available() {
        println!(
            "⚠️  {} is not set; embed requests will fail until it is",
            config.upstream.api_key_env
        );
    }

    println!("✅ Upstream client ready ({})", config.upstream.model);
    println!("📡 Proxying to {}", config.upstream.base_url);
    println!("🛑 Press Ctrl+C to stop");

    // Start the server
    start_http_server(Arc::new(config), Arc::new(embeddings)).await?;

    Ok(())
}
