use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The one embedding model this service speaks. The offline corpus job must
/// use the same identifier.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Output dimension of [`EMBEDDING_MODEL`].
pub const EMBEDDING_DIM: usize = 1536;

/// Connection settings for the embedding service.
///
/// The model is deliberately absent: see [`EMBEDDING_MODEL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API root, without the `/embeddings` suffix.
    pub base_url: String,
    /// Bearer token. Required; [`EmbeddingClient::new`](crate::EmbeddingClient::new)
    /// fails when it is missing.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Deadline for one embedding request.
    pub timeout: Duration,
    /// Re-normalize vectors to unit length after decoding.
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            timeout: Duration::from_secs(10),
            normalize: true,
        }
    }
}

impl EmbeddingConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}
