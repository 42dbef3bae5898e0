//! Configuration for the SmartChef API

use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::sqlite::SqliteConfig;
use domain_recipes::{EmbeddingConfig, RetrievalConfig};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub database: SqliteConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let retrieval = RetrievalConfig::from_env()?;
        let embedding = EmbeddingConfig::from_env()?;

        // The API never writes to the store.
        let database = SqliteConfig::read_only(retrieval.db_path()).with_pool_from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            retrieval,
            embedding,
            database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_wires_store_path_from_data_dir() {
        temp_env::with_vars(
            [
                ("APP_ENV", None),
                ("RECIPES_DATA_DIR", Some("/srv/smartchef")),
                ("RECIPES_DB_FILE", None),
                ("EMBEDDING_PROVIDER", None),
                ("DB_MAX_CONNECTIONS", Some("3")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "smartchef_api");
                assert_eq!(
                    config.database.path(),
                    std::path::Path::new("/srv/smartchef/recipes.db")
                );
                assert!(config.database.read_only);
                assert_eq!(config.database.max_connections, 3);
            },
        );
    }

    #[test]
    fn test_production_requires_cors_origin() {
        temp_env::with_vars(
            [("APP_ENV", Some("production")), ("CORS_ALLOWED_ORIGIN", None)],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
