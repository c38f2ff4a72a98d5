use anyhow::Context;
use chat_stream_bridge::{
    client::AzureOpenAiClient,
    config::BridgeConfig,
    handler::{AppState, router},
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "chat-stream-bridge", version, about)]
struct Args {
    /// TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::from_env()?,
    };
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    config.validate()?;

    info!("Starting chat stream bridge...");
    info!("  Listen: {}", config.server.listen_addr);
    info!("  Azure endpoint: {}", config.azure.endpoint);
    info!("  Deployment: {}", config.azure.deployment);
    info!("  Streaming: {}", config.azure.stream);
    info!("  Data source: {}", config.search.is_some());

    let provider = Arc::new(AzureOpenAiClient::new(config.azure.clone())?);
    let state = Arc::new(AppState::from_config(provider, &config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    info!("Bridge ready!");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
