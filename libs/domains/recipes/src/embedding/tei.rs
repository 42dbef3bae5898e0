use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{EmbeddingProvider, check_vectors};
use crate::error::{RecipeError, RecipeResult};

/// Hugging Face text-embeddings-inference server.
pub struct TeiProvider {
    client: Client,
    base_url: String,
}

impl TeiProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embed", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[async_trait]
impl EmbeddingProvider for TeiProvider {
    fn name(&self) -> &'static str {
        "tei"
    }

    async fn embed(&self, text: &str) -> RecipeResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RecipeError::ServiceUnavailable("tei returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> RecipeResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&EmbedRequest {
                inputs: texts,
                truncate: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecipeError::ServiceUnavailable(format!(
                "tei error ({status}): {error_text}"
            )));
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        check_vectors(self.name(), texts.len(), &vectors)?;
        debug!(count = vectors.len(), "Embedded texts");
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let provider = TeiProvider::new(Client::new(), "http://tei:8080/");
        assert_eq!(provider.endpoint(), "http://tei:8080/embed");
    }

    #[test]
    fn test_request_shape() {
        let inputs = vec!["high protein breakfast".to_string()];
        let body = serde_json::to_value(EmbedRequest {
            inputs: &inputs,
            truncate: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"inputs": ["high protein breakfast"], "truncate": true})
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let provider = TeiProvider::new(client, "http://127.0.0.1:9");
        assert!(matches!(
            provider.embed("soup").await,
            Err(RecipeError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = TeiProvider::new(Client::new(), "http://127.0.0.1:9");
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
