use crate::error::{ApiError, ServerResult};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use wwts::{Answer, ClientIdentity};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// `POST /api/ask`
///
/// The raw body goes to the pipeline unparsed so the rate limit applies
/// before any validation. An unreadable body (too large, aborted) counts
/// as empty and is rejected after the limiter has run.
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<Answer>> {
    let identity = ClientIdentity::from_forwarded_for(
        headers.get(FORWARDED_FOR).and_then(|v| v.to_str().ok()),
    );

    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "request body unreadable");
            Bytes::new()
        }
    };

    match tokio::time::timeout(state.config.timeout(), state.pipeline.ask(&identity, &body)).await
    {
        Ok(Ok(answer)) => Ok(Json(answer)),
        Ok(Err(err)) => Err(ApiError::from(err)),
        Err(_) => {
            tracing::error!(identity = %identity, "request exceeded deadline");
            Err(ApiError::Timeout)
        }
    }
}
