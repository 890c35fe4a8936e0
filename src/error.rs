use index::IndexError;
use ratelimit::RateLimitError;
use selector::SelectorError;
use semantic::SemanticError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// External collaborator a stage depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    RateLimitStore,
    Embedding,
    VectorIndex,
    ChatModel,
}

impl Dependency {
    pub const ALL: [Dependency; 4] = [
        Dependency::RateLimitStore,
        Dependency::Embedding,
        Dependency::VectorIndex,
        Dependency::ChatModel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dependency::RateLimitStore => "rate_limit_store",
            Dependency::Embedding => "embedding",
            Dependency::VectorIndex => "vector_index",
            Dependency::ChatModel => "chat_model",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one pipeline run. Each variant maps to exactly one
/// response class; none of the fields are meant for clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Malformed body, missing or mistyped `question`, or a failed screen.
    #[error("invalid input")]
    InvalidInput,
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{dependency} timed out")]
    UpstreamTimeout { dependency: Dependency },
    /// Credentials or addresses for a dependency are missing or unusable.
    #[error("{dependency} is not configured")]
    UpstreamConfiguration { dependency: Dependency },
    #[error("{dependency} failed: {message}")]
    Upstream {
        dependency: Dependency,
        message: String,
    },
}

impl PipelineError {
    pub fn dependency(&self) -> Option<Dependency> {
        match self {
            PipelineError::UpstreamTimeout { dependency }
            | PipelineError::UpstreamConfiguration { dependency }
            | PipelineError::Upstream { dependency, .. } => Some(*dependency),
            PipelineError::InvalidInput | PipelineError::RateLimited { .. } => None,
        }
    }

    fn upstream(dependency: Dependency, timeout: bool, config: bool, message: String) -> Self {
        if timeout {
            PipelineError::UpstreamTimeout { dependency }
        } else if config {
            PipelineError::UpstreamConfiguration { dependency }
        } else {
            PipelineError::Upstream {
                dependency,
                message,
            }
        }
    }
}

impl From<RateLimitError> for PipelineError {
    fn from(err: RateLimitError) -> Self {
        let config = matches!(err, RateLimitError::InvalidConfig(_));
        Self::upstream(
            Dependency::RateLimitStore,
            err.is_timeout(),
            config,
            err.to_string(),
        )
    }
}

impl From<SemanticError> for PipelineError {
    fn from(err: SemanticError) -> Self {
        Self::upstream(
            Dependency::Embedding,
            err.is_timeout(),
            err.is_config(),
            err.to_string(),
        )
    }
}

impl From<IndexError> for PipelineError {
    fn from(err: IndexError) -> Self {
        Self::upstream(
            Dependency::VectorIndex,
            err.is_timeout(),
            err.is_config(),
            err.to_string(),
        )
    }
}

impl From<SelectorError> for PipelineError {
    fn from(err: SelectorError) -> Self {
        Self::upstream(
            Dependency::ChatModel,
            err.is_timeout(),
            err.is_config(),
            err.to_string(),
        )
    }
}
