//! SQLite pool management on top of sqlx

mod config;
mod connector;
mod health;

pub use config::SqliteConfig;
pub use connector::{connect, connect_options, connect_with_retry};
pub use health::{HealthStatus, check_health, check_health_detailed};

pub use sqlx::SqlitePool;
