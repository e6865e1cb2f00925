use std::net::SocketAddr;

use anyhow::Context;
use ministry_report_backend::config::Config;
use ministry_report_backend::{create_router, initialize_backend, spawn_roster_watcher};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the domain and storage layers
    // are forwarded to the same subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_environment()?;
    let app_state = initialize_backend(&config)?;
    spawn_roster_watcher(app_state.clone());

    let app = create_router(app_state, &config.server.allowed_origin)?;

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_addr))?;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
