use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use super::SqliteConfig;
use crate::common::{DatabaseError, RetryConfig, retry_with_backoff_if};

/// Connection options derived from a [`SqliteConfig`].
pub fn connect_options(config: &SqliteConfig) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(&config.path)
        .read_only(config.read_only)
        .create_if_missing(config.create_if_missing)
        .busy_timeout(config.busy_timeout())
}

/// Open a pool and verify one connection.
///
/// A read-only config pointing at a missing file fails fast with
/// [`DatabaseError::ConfigError`] instead of surfacing a driver error.
pub async fn connect(config: &SqliteConfig) -> Result<SqlitePool, DatabaseError> {
    if !config.create_if_missing && !config.path.exists() {
        return Err(DatabaseError::ConfigError(format!(
            "SQLite database not found at {}",
            config.path.display()
        )));
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(connect_options(config))
        .await?;

    info!(
        path = %config.path.display(),
        read_only = config.read_only,
        max_connections = config.max_connections,
        "Connected to SQLite database"
    );

    Ok(pool)
}

/// [`connect`] with exponential backoff on transient failures.
pub async fn connect_with_retry(
    config: &SqliteConfig,
    retry_config: Option<RetryConfig>,
) -> Result<SqlitePool, DatabaseError> {
    retry_with_backoff_if(
        || connect(config),
        retry_config.unwrap_or_default(),
        DatabaseError::is_transient,
    )
    .await
}
