use anyhow::Context;
use tracing_subscriber::EnvFilter;

use recipe_api::app::{app, AppState};
use recipe_api::config::AppConfig;
use recipe_api::database::DatabaseManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: AppConfig = recipe_api::config::config().clone();
    tracing::info!("Starting Recipe API in {:?} mode", config.environment);

    let store = DatabaseManager::open_store(&config.database)
        .await
        .context("failed to open store")?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Recipe API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
