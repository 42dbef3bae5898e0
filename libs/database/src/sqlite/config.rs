use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "config")]
use core_config::{ConfigError, env_parse};

/// Pool settings for a file-backed SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    /// Path to the database file
    pub path: PathBuf,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// How long a caller waits for a free connection
    pub acquire_timeout_secs: u64,

    /// How long a statement waits on a locked database
    pub busy_timeout_secs: u64,

    /// Open with `SQLITE_OPEN_READONLY`
    pub read_only: bool,

    /// Create the file when it does not exist
    pub create_if_missing: bool,
}

impl SqliteConfig {
    /// Read-write config that creates the file if needed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 8,
            acquire_timeout_secs: 5,
            busy_timeout_secs: 5,
            read_only: false,
            create_if_missing: true,
        }
    }

    /// Config for a store that must already exist and is never written.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            read_only: true,
            create_if_missing: false,
            ..Self::new(path)
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Override pool sizing from `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT_SECS`.
    #[cfg(feature = "config")]
    pub fn with_pool_from_env(self) -> Result<Self, ConfigError> {
        let max_connections = env_parse("DB_MAX_CONNECTIONS", self.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::ParseError {
                key: "DB_MAX_CONNECTIONS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        let acquire_timeout_secs = env_parse("DB_ACQUIRE_TIMEOUT_SECS", self.acquire_timeout_secs)?;

        Ok(Self {
            max_connections,
            acquire_timeout_secs,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_defaults() {
        let config = SqliteConfig::read_only("data/recipes.db");
        assert!(config.read_only);
        assert!(!config.create_if_missing);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.path(), Path::new("data/recipes.db"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_pool_from_env() {
        temp_env::with_vars(
            [
                ("DB_MAX_CONNECTIONS", Some("16")),
                ("DB_ACQUIRE_TIMEOUT_SECS", Some("2")),
            ],
            || {
                let config = SqliteConfig::new("x.db").with_pool_from_env().unwrap();
                assert_eq!(config.max_connections, 16);
                assert_eq!(config.acquire_timeout(), Duration::from_secs(2));
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_pool_from_env_rejects_zero_connections() {
        temp_env::with_var("DB_MAX_CONNECTIONS", Some("0"), || {
            let err = SqliteConfig::new("x.db").with_pool_from_env().unwrap_err();
            assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        });
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_pool_from_env_defaults_when_unset() {
        temp_env::with_vars_unset(["DB_MAX_CONNECTIONS", "DB_ACQUIRE_TIMEOUT_SECS"], || {
            let config = SqliteConfig::new("x.db")
                .with_max_connections(3)
                .with_pool_from_env()
                .unwrap();
            assert_eq!(config.max_connections, 3);
            assert_eq!(config.acquire_timeout_secs, 5);
        });
    }
}
