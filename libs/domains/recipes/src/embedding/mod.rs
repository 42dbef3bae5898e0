mod openai;
mod provider;
mod tei;

use std::sync::Arc;

pub use openai::OpenAIProvider;
pub use provider::EmbeddingProvider;
#[cfg(test)]
pub use provider::MockEmbeddingProvider;
pub use tei::TeiProvider;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::{RecipeError, RecipeResult};

/// Construct the provider selected by `config`.
pub fn build_provider(config: &EmbeddingConfig) -> RecipeResult<Arc<dyn EmbeddingProvider>> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| RecipeError::Config(format!("failed to build HTTP client: {e}")))?;

    let provider: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Tei => Arc::new(TeiProvider::new(client, &config.base_url)),
        EmbeddingBackend::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                RecipeError::Config("OPENAI_API_KEY is required for the openai provider".into())
            })?;
            Arc::new(OpenAIProvider::new(
                client,
                &config.base_url,
                api_key,
                &config.model,
            ))
        }
    };
    Ok(provider)
}

/// Reject responses that do not hold one finite vector per input.
pub(crate) fn check_vectors(
    provider: &str,
    expected: usize,
    vectors: &[Vec<f32>],
) -> RecipeResult<()> {
    if vectors.len() != expected {
        return Err(RecipeError::ServiceUnavailable(format!(
            "{provider} returned {} embeddings for {expected} inputs",
            vectors.len()
        )));
    }
    if vectors
        .iter()
        .any(|v| v.is_empty() || v.iter().any(|x| !x.is_finite()))
    {
        return Err(RecipeError::ServiceUnavailable(format!(
            "{provider} returned an empty or non-finite embedding"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_by_backend() {
        let tei = build_provider(&EmbeddingConfig::tei("http://localhost:8081")).unwrap();
        assert_eq!(tei.name(), "tei");

        let mut openai = EmbeddingConfig::tei("https://api.openai.com/v1");
        openai.backend = EmbeddingBackend::OpenAi;
        assert!(matches!(
            build_provider(&openai),
            Err(RecipeError::Config(_))
        ));

        openai.api_key = Some("sk-test".into());
        assert_eq!(build_provider(&openai).unwrap().name(), "openai");
    }

    #[test]
    fn test_check_vectors() {
        assert!(check_vectors("tei", 1, &[vec![0.1, 0.2]]).is_ok());
        assert!(check_vectors("tei", 2, &[vec![0.1]]).is_err());
        assert!(check_vectors("tei", 1, &[vec![]]).is_err());
        assert!(check_vectors("tei", 1, &[vec![f32::NAN]]).is_err());
    }
}
