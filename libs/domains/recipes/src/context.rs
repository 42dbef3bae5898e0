use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::index::IndexRegistry;

/// Process-wide retrieval state, built once at startup and shared by every
/// request.
#[derive(Clone)]
pub struct RetrievalContext {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub registry: Arc<IndexRegistry>,
    pub top_k: NonZeroUsize,
}

impl RetrievalContext {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        registry: Arc<IndexRegistry>,
        top_k: NonZeroUsize,
    ) -> Self {
        Self {
            embedder,
            registry,
            top_k,
        }
    }

    /// Expected embedding dimension, fixed by the registry.
    pub fn dimension(&self) -> usize {
        self.registry.dimension()
    }
}
