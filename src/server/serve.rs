use axum::Router;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::info;

use crate::error::AreasResult;

pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub router: Router,
    pub max_concurrency: usize,
}

pub async fn serve(config: ServeConfig) -> AreasResult<()> {
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    info!("Areas API listening on {}", listener.local_addr()?);

    let app = config
        .router
        .layer(GlobalConcurrencyLimitLayer::new(config.max_concurrency));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
