use anyhow::Context;
use axum::{routing::get, Router};
use device_analytics::config::Settings;
use device_analytics::rest::{self, AppError, AppState};
use device_analytics::{db, metrics};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;

    info!("Starting device analytics API");
    info!("HTTP server: {}", settings.http_addr);
    info!("Database: {}", settings.database_host());
    info!("Query timeout: {:?}", settings.query_timeout);

    metrics::init_metrics().context("failed to register metrics")?;

    let pool = db::make_pool(&settings)
        .await
        .context("failed to connect to database")?;

    let state = AppState::new(pool.clone(), settings.query_timeout);
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(state));

    let listener = tokio::net::TcpListener::bind(&settings.http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", settings.http_addr))?;

    info!("HTTP server listening on {}", settings.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}

async fn metrics_handler() -> Result<String, AppError> {
    Ok(metrics::gather_metrics()?)
}
