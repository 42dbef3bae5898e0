use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{Span, error, info, instrument, warn};
use validator::Validate;

use crate::assembler::assemble;
use crate::context::RetrievalContext;
use crate::error::{RecipeError, RecipeResult};
use crate::index::{PreferenceKey, search};
use crate::models::{
    GetRecipesRequest, GetRecipesResponse, PreferenceCombination, PreferencesResponse,
};
use crate::repository::RecipeStore;

/// Where a retrieval is, reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Validating,
    Embedding,
    IndexResolving,
    Searching,
    Fetching,
    Assembling,
    Done,
}

impl RetrievalStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RetrievalStage::Validating => "validating",
            RetrievalStage::Embedding => "embedding",
            RetrievalStage::IndexResolving => "index_resolving",
            RetrievalStage::Searching => "searching",
            RetrievalStage::Fetching => "fetching",
            RetrievalStage::Assembling => "assembling",
            RetrievalStage::Done => "done",
        }
    }
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates one retrieval: validate, embed, resolve the index for the
/// exact preference set, search, fetch attributes, assemble.
pub struct RetrievalService<S: RecipeStore> {
    context: RetrievalContext,
    store: Arc<S>,
}

impl<S: RecipeStore> Clone for RetrievalService<S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecipeStore> RetrievalService<S> {
    pub fn new(context: RetrievalContext, store: S) -> Self {
        Self {
            context,
            store: Arc::new(store),
        }
    }

    pub fn context(&self) -> &RetrievalContext {
        &self.context
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(
        skip_all,
        fields(preference_key = tracing::field::Empty, candidates = tracing::field::Empty)
    )]
    pub async fn get_recipes(&self, request: GetRecipesRequest) -> RecipeResult<GetRecipesResponse> {
        let mut stage = RetrievalStage::Validating;
        let result = self.run(&request, &mut stage).await;

        if let Err(err) = &result {
            let error_code = err.error_code().as_str();
            match err {
                RecipeError::InvalidRequest(_) => {
                    info!(%stage, error_code, error = %err, "Rejected recipe request")
                }
                RecipeError::ServiceUnavailable(_) => {
                    warn!(%stage, error_code, error = %err, "Recipe retrieval failed")
                }
                _ => error!(%stage, error_code, error = %err, "Recipe retrieval failed"),
            }
        }
        result
    }

    async fn run(
        &self,
        request: &GetRecipesRequest,
        stage: &mut RetrievalStage,
    ) -> RecipeResult<GetRecipesResponse> {
        let (query, key) = validate(request)?;
        Span::current().record("preference_key", key.as_str());

        *stage = RetrievalStage::Embedding;
        let vector = self.context.embedder.embed(query).await?;
        if vector.iter().any(|v| !v.is_finite()) || vector.is_empty() {
            return Err(RecipeError::ServiceUnavailable(format!(
                "{} returned an unusable embedding",
                self.context.embedder.name()
            )));
        }
        if vector.len() != self.context.dimension() {
            return Err(RecipeError::DimensionMismatch {
                expected: self.context.dimension(),
                actual: vector.len(),
            });
        }

        *stage = RetrievalStage::IndexResolving;
        let index = self.context.registry.resolve(&key).await?;

        *stage = RetrievalStage::Searching;
        let k = self.context.top_k;
        let candidates = tokio::task::spawn_blocking(move || search(&index, &vector, k))
            .await
            .map_err(|e| RecipeError::Internal(format!("search task failed: {e}")))??;
        Span::current().record("candidates", candidates.len());

        *stage = RetrievalStage::Fetching;
        let attributes = if candidates.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
            self.store.fetch_by_ids(&ids).await?
        };

        *stage = RetrievalStage::Assembling;
        let recipes = assemble(&candidates, attributes);

        *stage = RetrievalStage::Done;
        info!(returned = recipes.len(), "Retrieved recipes");
        Ok(GetRecipesResponse::new(key.to_string(), recipes))
    }

    /// Preference combinations that currently have an index.
    pub async fn list_preferences(&self) -> RecipeResult<PreferencesResponse> {
        let keys = self
            .context
            .registry
            .available_keys()
            .await
            .inspect_err(|e| {
                error!(
                    error_code = e.error_code().as_str(),
                    error = %e,
                    "Listing preference combinations failed"
                )
            })?;
        let combinations = keys
            .into_iter()
            .map(|key| PreferenceCombination {
                tags: key.tags().map(str::to_string).collect(),
                key: key.to_string(),
            })
            .collect();
        Ok(PreferencesResponse { combinations })
    }

    pub async fn store_health(&self) -> RecipeResult<()> {
        self.store.health_check().await
    }
}

/// Non-blank query and a canonical key, before anything external is touched.
fn validate(request: &GetRecipesRequest) -> RecipeResult<(&str, PreferenceKey)> {
    request
        .validate()
        .map_err(|e| RecipeError::InvalidRequest(e.to_string()))?;
    let key = PreferenceKey::from_tags(&request.dietary_preference)?;
    Ok((request.query.trim(), key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::index::{FlatIndex, IndexRegistry};
    use crate::models::Recipe;
    use crate::repository::MockRecipeStore;
    use std::num::NonZeroUsize;
    use std::path::Path;
    use tempfile::TempDir;

    fn recipe(id: i64) -> Recipe {
        Recipe {
            id,
            name: format!("recipe {id}"),
            minutes: Some(20),
            description: None,
            ingredients: vec!["tofu".into()],
            nutrition: vec![100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            instructions: "cook".into(),
            tags: vec![],
            food_type: Some("vegetarian".into()),
            meal_type: Some("breakfast".into()),
        }
    }

    fn write_index(dir: &Path, tags: &[&str], ids: &[i64]) {
        let mut index = FlatIndex::new(2).unwrap();
        for &id in ids {
            index.add(id, &[id as f32, 0.0]).unwrap();
        }
        let key = PreferenceKey::from_tags(tags).unwrap();
        index.write_to(&dir.join(key.file_name())).unwrap();
    }

    /// Index dir with `vegetarian` (ids 1..=12) and `vegan_vegetarian` (ids 1..=3).
    fn fixture_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &["vegetarian"], &(1..=12).collect::<Vec<_>>());
        write_index(dir.path(), &["vegan", "vegetarian"], &[1, 2, 3]);
        dir
    }

    fn service(
        dir: &TempDir,
        embedder: MockEmbeddingProvider,
        store: MockRecipeStore,
    ) -> RetrievalService<MockRecipeStore> {
        let context = RetrievalContext::new(
            Arc::new(embedder),
            Arc::new(IndexRegistry::new(dir.path(), 2)),
            NonZeroUsize::new(10).unwrap(),
        );
        RetrievalService::new(context, store)
    }

    fn embedder_returning(vector: Vec<f32>) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_name().return_const("mock");
        embedder
            .expect_embed()
            .times(1)
            .returning(move |_| Ok(vector.clone()));
        embedder
    }

    fn store_with_all() -> MockRecipeStore {
        let mut store = MockRecipeStore::new();
        store
            .expect_fetch_by_ids()
            .returning(|ids| Ok(ids.iter().map(|&id| (id, recipe(id))).collect()));
        store
    }

    fn request(query: &str, prefs: &[&str]) -> GetRecipesRequest {
        GetRecipesRequest {
            query: query.to_string(),
            dietary_preference: prefs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_returns_nearest_first_bounded_by_top_k() {
        let dir = fixture_dir();
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .withf(|query| query == "high protein breakfast")
            .times(1)
            .returning(|_| Ok(vec![4.1, 0.0]));
        let service = service(&dir, embedder, store_with_all());

        let response = service
            .get_recipes(request("high protein breakfast", &["vegetarian"]))
            .await
            .unwrap();

        assert_eq!(response.preference_key, "vegetarian");
        assert_eq!(response.count, 10);
        assert_eq!(response.recipes[0].recipe.id, 4);
        assert_eq!(response.recipes[0].rank, 1);
        assert!(
            response
                .recipes
                .windows(2)
                .all(|w| w[0].distance <= w[1].distance)
        );
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_blank_query_never_embeds() {
        let dir = fixture_dir();
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();
        let mut store = MockRecipeStore::new();
        store.expect_fetch_by_ids().never();
        let service = service(&dir, embedder, store);

        let err = service
            .get_recipes(request("  ", &["vegetarian"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_preferences_never_embed() {
        let dir = fixture_dir();
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();
        let service = service(&dir, embedder, MockRecipeStore::new());

        for prefs in [&[][..], &["../secrets"][..], &[" "][..]] {
            let err = service.get_recipes(request("soup", prefs)).await.unwrap_err();
            assert!(matches!(err, RecipeError::InvalidRequest(_)), "{prefs:?}");
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_an_error_not_an_empty_result() {
        let dir = fixture_dir();
        let mut store = MockRecipeStore::new();
        store.expect_fetch_by_ids().never();
        let service = service(&dir, embedder_returning(vec![1.0, 0.0]), store);

        let err = service
            .get_recipes(request("salad", &["vegan", "keto"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::IndexMissing { ref key } if key == "keto_vegan"));
    }

    #[tokio::test]
    async fn test_tag_order_selects_same_index() {
        let dir = fixture_dir();

        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().times(2).returning(|_| Ok(vec![2.0, 0.0]));
        let service = service(&dir, embedder, store_with_all());

        let ab = service
            .get_recipes(request("curry", &["vegan", "vegetarian"]))
            .await
            .unwrap();
        let ba = service
            .get_recipes(request("curry", &["Vegetarian", "vegan"]))
            .await
            .unwrap();

        assert_eq!(ab.preference_key, "vegan_vegetarian");
        assert_eq!(ab, ba);
        assert_eq!(
            serde_json::to_vec(&ab).unwrap(),
            serde_json::to_vec(&ba).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_rows_are_omitted_in_order() {
        let dir = fixture_dir();
        let mut store = MockRecipeStore::new();
        store.expect_fetch_by_ids().times(1).returning(|ids| {
            Ok(ids
                .iter()
                .filter(|&&id| id != 2)
                .map(|&id| (id, recipe(id)))
                .collect())
        });
        let service = service(&dir, embedder_returning(vec![0.0, 0.0]), store);

        let response = service
            .get_recipes(request("porridge", &["vegan", "vegetarian"]))
            .await
            .unwrap();

        let ids: Vec<i64> = response.recipes.iter().map(|r| r.recipe.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(response.recipes[1].rank, 3);
    }

    #[tokio::test]
    async fn test_no_rows_gives_empty_success_with_message() {
        let dir = fixture_dir();
        let mut store = MockRecipeStore::new();
        store
            .expect_fetch_by_ids()
            .returning(|_| Ok(HashMap::new()));
        let service = service(&dir, embedder_returning(vec![0.0, 0.0]), store);

        let response = service
            .get_recipes(request("porridge", &["vegetarian"]))
            .await
            .unwrap();
        assert_eq!(response.count, 0);
        assert_eq!(
            response.message.as_deref(),
            Some(GetRecipesResponse::EMPTY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_embedder_failure_is_unavailable() {
        let dir = fixture_dir();
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(|_| Err(RecipeError::ServiceUnavailable("connection refused".into())));
        let mut store = MockRecipeStore::new();
        store.expect_fetch_by_ids().never();
        let service = service(&dir, embedder, store);

        let err = service
            .get_recipes(request("soup", &["vegetarian"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_wrong_embedding_dimension_is_never_coerced() {
        let dir = fixture_dir();
        let service = service(&dir, embedder_returning(vec![1.0, 0.0, 0.0]), MockRecipeStore::new());

        let err = service
            .get_recipes(request("soup", &["vegetarian"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecipeError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_non_finite_embedding_is_unavailable() {
        let dir = fixture_dir();
        let service = service(&dir, embedder_returning(vec![f32::NAN, 0.0]), MockRecipeStore::new());

        let err = service
            .get_recipes(request("soup", &["vegetarian"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_store_failure_aborts() {
        let dir = fixture_dir();
        let mut store = MockRecipeStore::new();
        store
            .expect_fetch_by_ids()
            .returning(|_| Err(RecipeError::Store("disk I/O error".into())));
        let service = service(&dir, embedder_returning(vec![0.0, 0.0]), store);

        let err = service
            .get_recipes(request("soup", &["vegetarian"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::Store(_)));
    }

    #[tokio::test]
    async fn test_list_preferences() {
        let dir = fixture_dir();
        let service = service(&dir, MockEmbeddingProvider::new(), MockRecipeStore::new());

        let response = service.list_preferences().await.unwrap();
        let keys: Vec<&str> = response.combinations.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["vegan_vegetarian", "vegetarian"]);
        assert_eq!(response.combinations[0].tags, vec!["vegan", "vegetarian"]);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(RetrievalStage::IndexResolving.to_string(), "index_resolving");
        assert_eq!(RetrievalStage::Done.as_str(), "done");
    }
}
