use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::RecipeResult;
use crate::models::Recipe;

/// Read access to recipe attributes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// One batched lookup. Ids without a (decodable) row are absent from the
    /// map; that is not an error.
    async fn fetch_by_ids(&self, ids: &[i64]) -> RecipeResult<HashMap<i64, Recipe>>;

    async fn health_check(&self) -> RecipeResult<()>;
}

/// In-memory implementation of RecipeStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecipeStore {
    recipes: Arc<RwLock<HashMap<i64, Recipe>>>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, recipe: Recipe) {
        self.recipes.write().await.insert(recipe.id, recipe);
    }

    pub async fn remove(&self, id: i64) -> Option<Recipe> {
        self.recipes.write().await.remove(&id)
    }
}

impl FromIterator<Recipe> for InMemoryRecipeStore {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        let recipes = iter.into_iter().map(|r| (r.id, r)).collect();
        Self {
            recipes: Arc::new(RwLock::new(recipes)),
        }
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn fetch_by_ids(&self, ids: &[i64]) -> RecipeResult<HashMap<i64, Recipe>> {
        let recipes = self.recipes.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| recipes.get(id).map(|r| (*id, r.clone())))
            .collect())
    }

    async fn health_check(&self) -> RecipeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64) -> Recipe {
        Recipe {
            id,
            name: format!("recipe {id}"),
            minutes: None,
            description: None,
            ingredients: vec![],
            nutrition: vec![0.0; 7],
            instructions: String::new(),
            tags: vec![],
            food_type: None,
            meal_type: None,
        }
    }

    #[tokio::test]
    async fn test_missing_ids_are_absent() {
        let store: InMemoryRecipeStore = [recipe(1), recipe(2)].into_iter().collect();
        let found = store.fetch_by_ids(&[2, 3, 1]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&1));
        assert!(!found.contains_key(&3));
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let store = InMemoryRecipeStore::new();
        store.insert(recipe(5)).await;
        assert_eq!(store.fetch_by_ids(&[5]).await.unwrap().len(), 1);
        assert!(store.remove(5).await.is_some());
        assert!(store.fetch_by_ids(&[5]).await.unwrap().is_empty());
    }
}
