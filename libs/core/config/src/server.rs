use crate::{env_or_default, env_parse, ConfigError, Environment, FromEnv};
use std::net::Ipv4Addr;

const DEV_CORS_ORIGIN: &str = "http://localhost:5173";

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by the CORS layer
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            cors_allowed_origins: vec![DEV_CORS_ORIGIN.to_string()],
        }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_cors_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromEnv for ServerConfig {
    /// - HOST: defaults to 0.0.0.0
    /// - PORT: defaults to 8080
    /// - CORS_ALLOWED_ORIGIN: comma-separated; required in production,
    ///   defaults to the Vite dev server otherwise
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse("PORT", 8080u16)?;

        let raw_origins = match std::env::var("CORS_ALLOWED_ORIGIN") {
            Ok(value) => value,
            Err(_) if Environment::from_env().is_production() => {
                return Err(ConfigError::MissingEnvVar("CORS_ALLOWED_ORIGIN".to_string()));
            }
            Err(_) => DEV_CORS_ORIGIN.to_string(),
        };

        let cors_allowed_origins = parse_origins(&raw_origins);
        if cors_allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 8080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("HOST", None::<&str>),
                ("PORT", None),
                ("APP_ENV", None),
                ("CORS_ALLOWED_ORIGIN", None),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.address(), "0.0.0.0:8080");
                assert_eq!(config.cors_allowed_origins, vec![DEV_CORS_ORIGIN]);
            },
        );
    }

    #[test]
    fn test_server_config_from_env_with_custom_values() {
        temp_env::with_vars(
            [
                ("HOST", Some("127.0.0.1")),
                ("PORT", Some("3000")),
                (
                    "CORS_ALLOWED_ORIGIN",
                    Some("https://smartchef.app, http://localhost:3000,"),
                ),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.address(), "127.0.0.1:3000");
                assert_eq!(
                    config.cors_allowed_origins,
                    vec!["https://smartchef.app", "http://localhost:3000"]
                );
            },
        );
    }

    #[test]
    fn test_server_config_from_env_invalid_port() {
        temp_env::with_var("PORT", Some("99999"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }

    #[test]
    fn test_production_requires_cors_origin() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("production")),
                ("CORS_ALLOWED_ORIGIN", None),
                ("PORT", None),
            ],
            || {
                let err = ServerConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "CORS_ALLOWED_ORIGIN"));
            },
        );
    }

    #[test]
    fn test_blank_cors_origin_is_rejected() {
        temp_env::with_vars([("CORS_ALLOWED_ORIGIN", Some(" , ")), ("PORT", None)], || {
            assert!(ServerConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_with_cors_origins() {
        let config = ServerConfig::new("localhost".to_string(), 9000)
            .with_cors_origins(["https://a.example"]);
        assert_eq!(config.address(), "localhost:9000");
        assert_eq!(config.cors_allowed_origins, vec!["https://a.example"]);
    }
}
