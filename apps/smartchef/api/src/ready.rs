//! Readiness endpoint

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::sqlite::check_health;
use std::path::Path;

use crate::state::AppState;

async fn index_dir_readable(dir: &Path) -> Result<(), String> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|e| format!("{}: {e}", dir.display()))?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(format!("{} is not a directory", dir.display()))
    }
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let store: HealthCheckFuture<'_> =
        Box::pin(async { check_health(&state.pool).await.map_err(|e| e.to_string()) });
    let indices: HealthCheckFuture<'_> = Box::pin(index_dir_readable(state.registry.index_dir()));

    run_health_checks(vec![("store", store), ("indices", indices)]).await
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
