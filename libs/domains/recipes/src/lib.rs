//! Recipe retrieval domain
//!
//! Answers a free-text query within one exact set of dietary preferences.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← POST /get-recipes, GET /preferences
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← validate → embed → resolve index → search → fetch → assemble
//! └──┬───┬───┬──┘
//!    │   │   │
//!    │   │ ┌─▼──────────┐
//!    │   │ │ RecipeStore│  ← SQLite attribute lookup by id
//!    │   │ └────────────┘
//!    │ ┌─▼──────────────┐
//!    │ │ IndexRegistry  │  ← one flat L2 index per preference combination
//!    │ └────────────────┘
//!  ┌─▼─────────────────┐
//!  │ EmbeddingProvider │  ← TEI / OpenAI-compatible HTTP
//!  └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//! use domain_recipes::{
//!     handlers, EmbeddingConfig, IndexRegistry, InMemoryRecipeStore, RetrievalContext,
//!     RetrievalService, build_provider,
//! };
//!
//! let embedder = build_provider(&EmbeddingConfig::tei("http://localhost:8081")).unwrap();
//! let registry = Arc::new(IndexRegistry::new("./data", 384));
//! let context = RetrievalContext::new(embedder, registry, NonZeroUsize::new(10).unwrap());
//!
//! let service = RetrievalService::new(context, InMemoryRecipeStore::new());
//! let router = handlers::router(service);
//! ```

pub mod assembler;
pub mod codec;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod index;
pub mod models;
pub mod repository;
pub mod schema;
pub mod service;
pub mod sqlite;

pub use config::{EmbeddingBackend, EmbeddingConfig, RetrievalConfig};
pub use context::RetrievalContext;
pub use embedding::{EmbeddingProvider, OpenAIProvider, TeiProvider, build_provider};
pub use error::{RecipeError, RecipeResult};
pub use index::{FlatIndex, IndexRegistry, PreferenceKey};
pub use models::{
    Candidate, EmbeddedRecipe, GetRecipesRequest, GetRecipesResponse, PreferenceCombination,
    PreferencesResponse, RankedRecipe, Recipe,
};
pub use repository::{InMemoryRecipeStore, RecipeStore};
pub use service::{RetrievalService, RetrievalStage};
pub use sqlite::{EmbeddingLoad, SqliteRecipeStore};
