use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use wwts::{PipelineError, GENERIC_ERROR};

pub type ServerResult<T> = Result<T, ApiError>;

/// Shown for every upstream failure, whatever the cause.
pub const UPSTREAM_ERROR: &str = "Something went wrong, try again";

/// Shown with every 429.
pub const RATE_LIMITED_ERROR: &str = "Take a breath. Come back in a bit.";

/// Client-facing error classes. Messages are fixed strings; causes stay in
/// server logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input")]
    BadRequest,

    #[error("rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream timeout")]
    UpstreamTimeout,

    #[error("upstream failure")]
    Upstream,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,

    #[error("request timeout")]
    Timeout,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, retry_after) = match self {
            ApiError::BadRequest => (GENERIC_ERROR, None),
            ApiError::RateLimited { retry_after_secs } => {
                (RATE_LIMITED_ERROR, Some(*retry_after_secs))
            }
            ApiError::UpstreamTimeout | ApiError::Upstream | ApiError::Timeout => {
                (UPSTREAM_ERROR, None)
            }
            ApiError::MethodNotAllowed => ("Method not allowed", None),
            ApiError::NotFound => ("Not found", None),
        };
        ErrorBody { error, retry_after }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput => ApiError::BadRequest,
            PipelineError::RateLimited { retry_after_secs } => {
                ApiError::RateLimited { retry_after_secs }
            }
            PipelineError::UpstreamTimeout { .. } => ApiError::UpstreamTimeout,
            PipelineError::UpstreamConfiguration { .. } | PipelineError::Upstream { .. } => {
                ApiError::Upstream
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.body())).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
