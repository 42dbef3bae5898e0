use async_trait::async_trait;

use crate::error::RecipeResult;

/// Maps text to a fixed-dimension vector.
///
/// Any failure to obtain a vector is [`RecipeError::ServiceUnavailable`];
/// callers never receive a placeholder vector.
///
/// [`RecipeError::ServiceUnavailable`]: crate::error::RecipeError::ServiceUnavailable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    async fn embed(&self, text: &str) -> RecipeResult<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> RecipeResult<Vec<Vec<f32>>>;
}
