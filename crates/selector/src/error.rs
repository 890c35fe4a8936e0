use thiserror::Error;

/// Errors from the chat-model call. Each one ends the request; none are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectorError {
    #[error("invalid chat config: {0}")]
    InvalidConfig(String),
    #[error("chat completion timed out")]
    Timeout,
    #[error("chat request failed: {0}")]
    Request(String),
    #[error("chat service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// No `choices[0].message.content` string in an otherwise successful reply.
    #[error("malformed chat response: {0}")]
    MalformedResponse(String),
}

impl SelectorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SelectorError::Timeout)
    }

    pub fn is_config(&self) -> bool {
        matches!(self, SelectorError::InvalidConfig(_))
    }
}

impl From<reqwest::Error> for SelectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SelectorError::Timeout
        } else {
            SelectorError::Request(err.to_string())
        }
    }
}
