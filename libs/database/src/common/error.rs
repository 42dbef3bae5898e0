/// Error type for connector operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Driver error from sqlx
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Configuration problems and a missing database file never heal on
    /// their own; pool timeouts and I/O hiccups might.
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            DatabaseError::Sqlite(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed
            ),
            DatabaseError::ConnectionFailed(_) | DatabaseError::HealthCheckFailed(_) => true,
            DatabaseError::ConfigError(_) => false,
        }
    }
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
