//! Application state management

use database::sqlite::SqlitePool;
use domain_recipes::IndexRegistry;
use std::sync::Arc;

/// Handles the readiness probe needs.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub registry: Arc<IndexRegistry>,
}
