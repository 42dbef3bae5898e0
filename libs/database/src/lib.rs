//! Database connectors and shared utilities.
//!
//! # Features
//!
//! - `sqlite` (default) - SQLite pool via sqlx
//! - `config` (default) - pool settings from the environment through `core_config`
//!
//! ```ignore
//! use database::sqlite::{self, SqliteConfig};
//!
//! let config = SqliteConfig::read_only("data/recipes.db");
//! let pool = sqlite::connect_with_retry(&config, None).await?;
//! sqlite::check_health(&pool).await?;
//! ```

pub mod common;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use common::{DatabaseError, DatabaseResult};
