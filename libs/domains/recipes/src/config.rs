use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};

const DEFAULT_TOP_K: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(k) => k,
    None => unreachable!(),
};
/// all-MiniLM-L6-v2
const DEFAULT_DIMENSION: NonZeroUsize = match NonZeroUsize::new(384) {
    Some(d) => d,
    None => unreachable!(),
};

/// Upper bound on `RECIPES_TOP_K`.
pub const MAX_TOP_K: usize = 1000;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_TEI_URL: &str = "http://localhost:8081";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Where the store and indices live and how retrieval is sized.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    pub data_dir: PathBuf,
    pub db_file: String,
    pub top_k: NonZeroUsize,
    pub dimension: usize,
}

impl RetrievalConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_file: "recipes.db".to_string(),
            top_k: DEFAULT_TOP_K,
            dimension: DEFAULT_DIMENSION.get(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    /// Index files sit next to the store file.
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }
}

impl FromEnv for RetrievalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let top_k: NonZeroUsize = env_parse("RECIPES_TOP_K", DEFAULT_TOP_K)?;
        if top_k.get() > MAX_TOP_K {
            return Err(ConfigError::ParseError {
                key: "RECIPES_TOP_K".to_string(),
                details: format!("must be at most {MAX_TOP_K}, got {top_k}"),
            });
        }

        Ok(Self {
            data_dir: PathBuf::from(env_or_default("RECIPES_DATA_DIR", "./data")),
            db_file: env_or_default("RECIPES_DB_FILE", "recipes.db"),
            top_k,
            dimension: env_parse("RECIPES_EMBEDDING_DIM", DEFAULT_DIMENSION)?.get(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Hugging Face text-embeddings-inference
    Tei,
    /// Any OpenAI-compatible `/embeddings` endpoint
    OpenAi,
}

impl EmbeddingBackend {
    fn default_base_url(self) -> &'static str {
        match self {
            EmbeddingBackend::Tei => DEFAULT_TEI_URL,
            EmbeddingBackend::OpenAi => DEFAULT_OPENAI_URL,
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tei" => Ok(EmbeddingBackend::Tei),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            other => Err(format!("unknown embedding provider '{other}', expected tei or openai")),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Tei => f.write_str("tei"),
            EmbeddingBackend::OpenAi => f.write_str("openai"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

// Keeps the API key out of logs.
impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EmbeddingConfig {
    pub fn tei(base_url: impl Into<String>) -> Self {
        Self {
            backend: EmbeddingBackend::Tei,
            base_url: base_url.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend: EmbeddingBackend = env_parse("EMBEDDING_PROVIDER", EmbeddingBackend::Tei)?;
        let base_url = env_or_default("EMBEDDING_BASE_URL", backend.default_base_url())
            .trim_end_matches('/')
            .to_string();
        let api_key = match backend {
            EmbeddingBackend::OpenAi => Some(env_required("OPENAI_API_KEY")?),
            EmbeddingBackend::Tei => std::env::var("OPENAI_API_KEY").ok(),
        };
        let timeout_secs: u64 = env_parse("EMBEDDING_TIMEOUT_SECS", 10)?;

        Ok(Self {
            backend,
            base_url,
            model: env_or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
