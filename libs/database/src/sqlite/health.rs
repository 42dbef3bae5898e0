use sqlx::SqlitePool;
use std::time::Instant;
use tracing::debug;

use crate::common::DatabaseError;

/// Run `SELECT 1` on a pooled connection.
pub async fn check_health(pool: &SqlitePool) -> Result<(), DatabaseError> {
    debug!("Running SQLite health check");

    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("SQLite health check failed: {}", e)))?;

    Ok(())
}

/// Health check outcome with timing
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(message: String, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }
}

/// [`check_health`] with elapsed time, never failing.
pub async fn check_health_detailed(pool: &SqlitePool) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(pool).await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(elapsed),
        Err(e) => HealthStatus::unhealthy(e.to_string(), elapsed),
    }
}
