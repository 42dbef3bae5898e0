//! SmartChef Indexer
//!
//! Offline builder for the recipe store and the per-preference vector
//! indices the API serves from. Run `load-db` once per dataset, then
//! `build-indices`.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use database::sqlite::{SqliteConfig, connect};
use domain_recipes::{RetrievalConfig, SqliteRecipeStore};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

mod build;
mod literal;
mod loader;

use build::{Selection, build_indices};

#[derive(Parser)]
#[command(name = "smartchef-indexer")]
#[command(about = "Build the SmartChef recipe store and vector indices")]
struct Cli {
    /// Data directory holding the store and index files (default: RECIPES_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the cleaned recipes CSV into the SQLite store, replacing its contents
    LoadDb {
        /// Path to the cleaned recipes CSV
        #[arg(long)]
        csv: PathBuf,

        /// Store file to write. Defaults to <data-dir>/<RECIPES_DB_FILE>.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Write one index per dietary-preference combination
    BuildIndices {
        /// Comma-separated food types forming one combination. Repeatable.
        #[arg(short, long = "combination")]
        combinations: Vec<String>,

        /// Build every combination of the food types present in the store
        #[arg(long, conflicts_with = "combinations")]
        all: bool,

        /// Store file to read. Defaults to <data-dir>/<RECIPES_DB_FILE>.
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    let mut config = RetrievalConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::LoadDb { csv, db } => {
            let db_path = db.unwrap_or_else(|| config.db_path());
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
            }

            let records = loader::read_csv(&csv)?;

            let pool = connect(&SqliteConfig::new(&db_path))
                .await
                .wrap_err("failed to open recipe store")?;
            let store = SqliteRecipeStore::new(pool.clone());
            let count = store
                .replace_all(&records)
                .await
                .wrap_err("failed to load recipes, store left unchanged")?;
            pool.close().await;

            info!(count, db = %db_path.display(), "Recipe store loaded");
        }

        Commands::BuildIndices {
            combinations,
            all,
            db,
        } => {
            let selection = Selection::from_args(&combinations, all)?;
            let db_path = db.unwrap_or_else(|| config.db_path());

            let pool = connect(&SqliteConfig::read_only(&db_path))
                .await
                .wrap_err("failed to open recipe store")?;
            let store = SqliteRecipeStore::new(pool.clone());

            let summary =
                build_indices(&store, &config.index_dir(), config.dimension, selection).await?;
            pool.close().await;

            info!(
                indices = summary.written.len(),
                recipes = summary.recipes_read,
                skipped = summary.recipes_skipped,
                dir = %config.index_dir().display(),
                "Index build complete"
            );
        }
    }

    Ok(())
}
