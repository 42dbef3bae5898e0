//! SmartChef API - recipe retrieval over HTTP

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::sqlite::connect_with_retry;
use domain_recipes::{
    IndexRegistry, RetrievalContext, RetrievalService, SqliteRecipeStore, build_provider,
    handlers::{self, ApiDoc},
};
use eyre::WrapErr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod config;
mod ready;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        path = %config.database.path().display(),
        "Opening recipe store"
    );
    let pool = connect_with_retry(&config.database, None)
        .await
        .wrap_err("failed to open recipe store")?;

    let embedder = build_provider(&config.embedding)?;
    info!(
        provider = embedder.name(),
        base_url = %config.embedding.base_url,
        "Embedding provider configured"
    );

    let registry = Arc::new(IndexRegistry::new(
        config.retrieval.index_dir(),
        config.retrieval.dimension,
    ));
    match registry.warm_up().await {
        Ok(0) => warn!(
            dir = %registry.index_dir().display(),
            "No index files found; every request will report a missing index"
        ),
        Ok(loaded) => info!(loaded, "Indices loaded"),
        Err(e) => return Err(e).wrap_err("failed to load indices"),
    }

    let context = RetrievalContext::new(embedder, Arc::clone(&registry), config.retrieval.top_k);
    let service = RetrievalService::new(context, SqliteRecipeStore::new(pool.clone()));

    let state = AppState {
        pool: pool.clone(),
        registry,
    };

    let router = create_router::<ApiDoc>(handlers::router(service), &config.server)?;
    let app = router
        .merge(health_router(config.app))
        .merge(ready::router(state));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing recipe store");
        pool.close().await;
        info!("Recipe store closed");
    })
    .await
    .wrap_err("server error")?;

    info!("SmartChef API shutdown complete");
    Ok(())
}
