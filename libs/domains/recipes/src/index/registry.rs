use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use super::format::FlatIndex;
use super::key::PreferenceKey;
use crate::error::{RecipeError, RecipeResult};

type Slot = Arc<OnceCell<Arc<FlatIndex>>>;

/// Resolves preference keys to loaded indices and caches them for the
/// lifetime of the process.
///
/// Concurrent first requests for one key share a single load. A failed load
/// leaves the slot empty so a later request can retry. Missing files are
/// not cached at all, so an index built after startup is picked up.
pub struct IndexRegistry {
    dir: PathBuf,
    dimension: usize,
    slots: RwLock<HashMap<PreferenceKey, Slot>>,
}

impl IndexRegistry {
    pub fn new(dir: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            dir: dir.into(),
            dimension,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.dir
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn path_for(&self, key: &PreferenceKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// The loaded index for exactly `key`. No superset, subset or merged
    /// index is ever substituted.
    pub async fn resolve(&self, key: &PreferenceKey) -> RecipeResult<Arc<FlatIndex>> {
        let existing = self.slots.read().await.get(key).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                if !self.index_file_exists(key).await? {
                    return Err(RecipeError::IndexMissing {
                        key: key.to_string(),
                    });
                }
                self.slots
                    .write()
                    .await
                    .entry(key.clone())
                    .or_default()
                    .clone()
            }
        };

        let index = slot.get_or_try_init(|| self.load(key)).await?;
        Ok(Arc::clone(index))
    }

    /// `Ok(false)` only when the file is known to be absent. Any other I/O
    /// failure is a deployment fault, not a missing combination.
    async fn index_file_exists(&self, key: &PreferenceKey) -> RecipeResult<bool> {
        let path = self.path_for(key);
        tokio::fs::try_exists(&path).await.map_err(|e| {
            RecipeError::Internal(format!("cannot access index file {}: {e}", path.display()))
        })
    }

    async fn load(&self, key: &PreferenceKey) -> RecipeResult<Arc<FlatIndex>> {
        let path = self.path_for(key);
        let dimension = self.dimension;
        let blocking_path = path.clone();

        let loaded = tokio::task::spawn_blocking(move || FlatIndex::load(&blocking_path, dimension))
            .await
            .map_err(|e| RecipeError::Internal(format!("index loader task failed: {e}")))?;

        let index = match loaded {
            Ok(index) => index,
            Err(e) => {
                // Removed between the existence check and the read.
                if !self.index_file_exists(key).await? {
                    return Err(RecipeError::IndexMissing {
                        key: key.to_string(),
                    });
                }
                warn!(preference_key = %key, error = %e, "Failed to load vector index");
                return Err(e);
            }
        };

        info!(
            preference_key = %key,
            vectors = index.len(),
            path = %path.display(),
            "Loaded vector index"
        );
        Ok(Arc::new(index))
    }

    /// Keys with an index file in the directory, sorted.
    pub async fn available_keys(&self) -> RecipeResult<Vec<PreferenceKey>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            RecipeError::Config(format!(
                "cannot read index directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RecipeError::Internal(e.to_string()))?
        {
            if let Some(key) = entry.file_name().to_str().and_then(PreferenceKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        debug!(count = keys.len(), "Discovered index files");
        Ok(keys)
    }

    /// Load every available index up front. Returns how many loaded.
    pub async fn warm_up(&self) -> RecipeResult<usize> {
        let keys = self.available_keys().await?;
        for key in &keys {
            self.resolve(key).await?;
        }
        Ok(keys.len())
    }

    /// Number of indices currently held in memory.
    pub async fn loaded_count(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tags: &[&str]) -> PreferenceKey {
        PreferenceKey::from_tags(tags).unwrap()
    }

    fn write_index(dir: &Path, key: &PreferenceKey, ids: &[i64]) {
        let mut index = FlatIndex::new(2).unwrap();
        for &id in ids {
            index.add(id, &[id as f32, 1.0]).unwrap();
        }
        index.write_to(&dir.join(key.file_name())).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_caches_handle() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["vegan"]), &[1, 2]);
        let registry = IndexRegistry::new(dir.path(), 2);

        let first = registry.resolve(&key(&["vegan"])).await.unwrap();
        let second = registry.resolve(&key(&["Vegan"])).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.loaded_count().await, 1);
    }

    #[tokio::test]
    async fn test_order_of_tags_resolves_same_index() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["vegan", "vegetarian"]), &[3]);
        let registry = IndexRegistry::new(dir.path(), 2);

        let ab = registry.resolve(&key(&["vegan", "vegetarian"])).await.unwrap();
        let ba = registry.resolve(&key(&["vegetarian", "vegan"])).await.unwrap();
        assert!(Arc::ptr_eq(&ab, &ba));
    }

    #[tokio::test]
    async fn test_missing_index_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["vegan"]), &[1]);
        write_index(dir.path(), &key(&["keto"]), &[2]);
        let registry = IndexRegistry::new(dir.path(), 2);

        let err = registry.resolve(&key(&["vegan", "keto"])).await.unwrap_err();
        assert!(matches!(err, RecipeError::IndexMissing { ref key } if key == "keto_vegan"));
        assert_eq!(registry.loaded_count().await, 0);
    }

    #[tokio::test]
    async fn test_unreadable_index_dir_is_not_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("recipes.db");
        std::fs::write(&not_a_dir, b"").unwrap();
        let registry = IndexRegistry::new(&not_a_dir, 2);

        let err = registry.resolve(&key(&["vegan"])).await.unwrap_err();
        assert!(matches!(err, RecipeError::Internal(_)), "{err:?}");
        assert_eq!(registry.loaded_count().await, 0);
    }

    #[tokio::test]
    async fn test_index_built_later_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(dir.path(), 2);
        let vegan = key(&["vegan"]);

        assert!(registry.resolve(&vegan).await.is_err());
        write_index(dir.path(), &vegan, &[1]);
        assert_eq!(registry.resolve(&vegan).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_share_one_index() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["pescetarian"]), &[1, 2, 3]);
        let registry = Arc::new(IndexRegistry::new(dir.path(), 2));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.resolve(&key(&["pescetarian"])).await })
            })
            .collect();

        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await.unwrap().unwrap());
        }
        assert!(loaded.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_reported_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["vegan"]), &[1]);
        let registry = IndexRegistry::new(dir.path(), 384);

        let err = registry.resolve(&key(&["vegan"])).await.unwrap_err();
        assert!(matches!(err, RecipeError::DimensionMismatch { expected: 384, actual: 2 }));
        assert_eq!(registry.loaded_count().await, 0);
    }

    #[tokio::test]
    async fn test_available_keys_and_warm_up() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &key(&["vegetarian"]), &[1]);
        write_index(dir.path(), &key(&["meat-based", "vegan"]), &[2]);
        std::fs::write(dir.path().join("recipes.db"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        let registry = IndexRegistry::new(dir.path(), 2);

        let keys = registry.available_keys().await.unwrap();
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["meat-based_vegan", "vegetarian"]);

        assert_eq!(registry.warm_up().await.unwrap(), 2);
        assert_eq!(registry.loaded_count().await, 2);
    }
}
