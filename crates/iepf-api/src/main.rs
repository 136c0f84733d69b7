//! iepf API Server
//!
//! REST API server for user accounts and session authentication.

use iepf_api::{create_router, logging::init_tracing, state::AppState};
use iepf_core::{config::AppConfig, PgStore};
use std::sync::Arc;

/// Optional TOML file read before the environment
const CONFIG_PATH_VAR: &str = "IEPF_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging)?;
    config.validate()?;

    let store = Arc::new(
        PgStore::connect(&config.database.url, config.database.max_connections).await?,
    );
    store.migrate().await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState::new(config, store.clone(), store));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("iepf API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("iepf API Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
