//! Temporary SQLite store for tests.

use database::sqlite::{SqliteConfig, SqlitePool, connect};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A SQLite file in its own temporary directory.
///
/// The directory, and with it the database, is removed on drop.
pub struct TestDatabase {
    dir: TempDir,
    path: PathBuf,
    pool: SqlitePool,
}

impl TestDatabase {
    /// Create an empty database file named `recipes.db`.
    ///
    /// ```no_run
    /// use test_utils::TestDatabase;
    ///
    /// # async fn example() {
    /// let db = TestDatabase::new().await;
    /// db.execute("CREATE TABLE t (id INTEGER)").await;
    /// # }
    /// ```
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("recipes.db");

        let pool = connect(&SqliteConfig::new(&path).with_max_connections(4))
            .await
            .expect("Failed to open test database");

        tracing::debug!(path = %path.display(), "Test database ready");
        Self { dir, path, pool }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the database file; index files can be written here.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Run one or more `;`-separated statements.
    pub async fn execute(&self, sql: &str) {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to execute test SQL: {e}\n{sql}"));
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_is_usable_and_removed_on_drop() {
        let db = TestDatabase::new().await;
        db.execute("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2);")
            .await;
        assert_eq!(db.count("t").await, 2);

        let dir = db.dir().to_path_buf();
        assert!(db.path().exists());
        drop(db);
        assert!(!dir.exists());
    }
}
