use thiserror::Error;

/// Errors surfaced by the embedding client. None are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Missing credentials or an unusable endpoint.
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// The embedding service did not answer within the configured timeout.
    #[error("embedding request timed out")]
    Timeout,
    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The service answered with a non-success status.
    #[error("embedding service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The body could not be decoded into an embedding.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The vector length does not match the pinned model.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl SemanticError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SemanticError::Timeout)
    }

    pub fn is_config(&self) -> bool {
        matches!(self, SemanticError::InvalidConfig(_))
    }
}

impl From<reqwest::Error> for SemanticError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SemanticError::Timeout
        } else {
            SemanticError::Request(err.to_string())
        }
    }
}
