use thiserror::Error;

/// Errors surfaced by counter stores. None of them may be read as "allowed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The store is missing credentials or has an unusable address.
    #[error("invalid rate limit store config: {0}")]
    InvalidConfig(String),
    /// The store did not answer within its deadline.
    #[error("rate limit store timed out")]
    Timeout,
    /// The store could not be reached or rejected the command.
    #[error("rate limit store unavailable: {0}")]
    Store(String),
    /// The store answered with something other than `[allowed, reset]`.
    #[error("malformed rate limit store reply: {0}")]
    MalformedReply(String),
}

impl RateLimitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RateLimitError::Timeout)
    }
}

impl From<reqwest::Error> for RateLimitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RateLimitError::Timeout
        } else {
            RateLimitError::Store(format!("HTTP request failed: {err}"))
        }
    }
}
