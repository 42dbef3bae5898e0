//! Shared test utilities for the SmartChef crates
//!
//! - `TestDatabase`: temporary SQLite store with automatic cleanup
//! - `TestDataDir`: temporary data directory for index fixtures
//! - `TestDataBuilder`: deterministic test data generation
//! - `assertions`: custom assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_store_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let recipe_id = builder.recipe_id(0);
//!     let name = builder.name("recipe", "main");
//! }
//! ```

mod sqlite;

pub use sqlite::TestDatabase;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory laid out like a data directory.
pub struct TestDataDir {
    dir: TempDir,
}

impl TestDataDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` to `name` inside the directory.
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.join(name);
        std::fs::write(&path, bytes).expect("Failed to write test file");
        path
    }

    /// File names in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path())
            .expect("Failed to read test dir")
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestDataDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for test data with deterministic randomization
///
/// The same seed always yields the same ids, names and vectors, so tests are
/// reproducible.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_fetch_by_ids");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Positive recipe id, distinct for each `n` within one builder.
    pub fn recipe_id(&self, n: u32) -> i64 {
        let base = (self.seed % 1_000_000) as i64 * 1_000;
        base + i64::from(n) + 1
    }

    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("recipe", "main"), "test-recipe-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Vector with 1.0 at `axis` and 0.0 elsewhere.
    pub fn unit_vector(&self, dimension: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimension];
        v[axis % dimension] = 1.0;
        v
    }

    /// Pseudo-random vector in `[-1, 1)`, fixed by seed and `salt`.
    pub fn vector(&self, dimension: usize, salt: u64) -> Vec<f32> {
        let mut state = self.seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (0..dimension)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that values are sorted non-decreasing with a nice error message
    pub fn assert_non_decreasing(values: &[f32], context: &str) {
        if let Some(pos) = values.windows(2).position(|w| w[0] > w[1]) {
            panic!(
                "{}: value at {} ({}) is greater than the next ({})",
                context,
                pos,
                values[pos],
                values[pos + 1]
            );
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.recipe_id(3), builder2.recipe_id(3));
        assert_eq!(builder1.vector(8, 1), builder2.vector(8, 1));
        assert_eq!(
            builder1.name("recipe", "test"),
            builder2.name("recipe", "test")
        );
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.vector(8, 0), builder2.vector(8, 0));
    }

    #[test]
    fn test_vectors_are_bounded() {
        let builder = TestDataBuilder::new(1);
        let v = builder.vector(64, 9);
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|x| (-1.0..1.0).contains(x)));
        assert_eq!(builder.unit_vector(4, 2), vec![0.0, 0.0, 1.0, 0.0]);
        assert!(builder.recipe_id(0) > 0);
    }

    #[test]
    fn test_data_dir_write_and_list() {
        let dir = TestDataDir::new();
        dir.write("b.idx", b"x");
        dir.write("a.idx", b"y");
        assert_eq!(dir.file_names(), vec!["a.idx", "b.idx"]);
    }

    #[test]
    #[should_panic(expected = "ordering")]
    fn test_assert_non_decreasing_panics() {
        assertions::assert_non_decreasing(&[0.1, 0.3, 0.2], "ordering");
    }
}
