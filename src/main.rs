use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mozi::config::{Cli, Config};
use mozi::state::AppState;
use mozi::upstream::HttpUpstream;
use mozi::view::ViewBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Fail fast on a locale the shell could not collate with
    ViewBuilder::new(&config.display.locale)?;

    let upstream = HttpUpstream::new(Duration::from_secs(config.upstream.timeout_secs))?;
    tracing::info!("Proxying /backend to {}", config.upstream.base_url);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = mozi::routes::app(AppState::new(config, Arc::new(upstream)));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
