use std::path::PathBuf;
use std::sync::Arc;

use crate::{IndexError, MemoryIndex, PostgrestConfig, PostgrestIndex, VectorIndex};

/// Configuration for selecting and building a corpus backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // Local JSON corpus written by the offline embedding job
/// let config = BackendConfig::memory("data/lyrics.json");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum BackendConfig {
    /// Load `[{ "text", "embedding" }]` from a file and scan it in process.
    Memory { corpus_path: PathBuf },
    /// Call a pgvector similarity function over PostgREST.
    Postgrest(PostgrestConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Postgrest(PostgrestConfig::default())
    }
}

impl BackendConfig {
    pub fn memory(path: impl Into<PathBuf>) -> Self {
        BackendConfig::Memory {
            corpus_path: path.into(),
        }
    }

    pub fn postgrest(cfg: PostgrestConfig) -> Self {
        BackendConfig::Postgrest(cfg)
    }

    /// Whether the credentials this backend needs are present.
    pub fn is_configured(&self) -> bool {
        match self {
            BackendConfig::Memory { corpus_path } => !corpus_path.as_os_str().is_empty(),
            BackendConfig::Postgrest(cfg) => {
                !cfg.url.trim().is_empty()
                    && cfg.key.as_deref().is_some_and(|k| !k.trim().is_empty())
            }
        }
    }
}

/// Builds the configured backend. Embeddings in a memory corpus must be `dim` long.
pub fn build_index(cfg: &BackendConfig, dim: usize) -> Result<Arc<dyn VectorIndex>, IndexError> {
    match cfg {
        BackendConfig::Memory { corpus_path } => {
            let index = MemoryIndex::from_json_file(corpus_path, dim)?;
            tracing::info!(entries = index.len(), path = %corpus_path.display(), "lyric corpus loaded");
            Ok(Arc::new(index))
        }
        BackendConfig::Postgrest(pg) => Ok(Arc::new(PostgrestIndex::new(pg.clone())?)),
    }
}
