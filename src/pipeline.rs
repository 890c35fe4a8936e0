use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use index::CandidateRetriever;
use ratelimit::{RateLimiter, Verdict};
use selector::{FallbackPicker, SelectionOutcome, Selector};
use semantic::Embedder;

use crate::error::PipelineError;
use crate::identity::ClientIdentity;
use crate::lazy::LazyHandle;
use crate::metrics::MetricsSpan;

/// The fixed stage sequence of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Client identity resolved, recorded as each request enters.
    Identify,
    RateLimitHourly,
    RateLimitDaily,
    ValidateBody,
    Sanitize,
    Embed,
    Retrieve,
    SelectOrFallback,
    /// Whole request, with its final outcome.
    Respond,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Identify,
        Stage::RateLimitHourly,
        Stage::RateLimitDaily,
        Stage::ValidateBody,
        Stage::Sanitize,
        Stage::Embed,
        Stage::Retrieve,
        Stage::SelectOrFallback,
        Stage::Respond,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Identify => "identify",
            Stage::RateLimitHourly => "rate_limit_hourly",
            Stage::RateLimitDaily => "rate_limit_daily",
            Stage::ValidateBody => "validate_body",
            Stage::Sanitize => "sanitize",
            Stage::Embed => "embed",
            Stage::Retrieve => "retrieve",
            Stage::SelectOrFallback => "select_or_fallback",
            Stage::Respond => "respond",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body of `POST /api/ask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

impl AskRequest {
    /// Malformed JSON, a missing `question` or a non-string one are all
    /// `InvalidInput`.
    pub fn from_slice(body: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(body).map_err(|err| {
            debug!(error = %err, "request body rejected");
            PipelineError::InvalidInput
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricSource {
    /// Picked by the selector from retrieved candidates.
    Matched,
    /// Drawn from the fallback pool.
    Fallback,
}

impl LyricSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LyricSource::Matched => "matched",
            LyricSource::Fallback => "fallback",
        }
    }
}

/// A successful run. Serializes as `{ "lyric": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub lyric: String,
    #[serde(skip)]
    pub source: LyricSource,
}

/// Client handles used by the pipeline, each resolved only when its stage
/// is reached.
pub struct PipelineHandles {
    pub limiter: LazyHandle<RateLimiter>,
    pub embedder: LazyHandle<dyn Embedder>,
    pub retriever: LazyHandle<CandidateRetriever>,
    pub selector: LazyHandle<Selector>,
}

/// Strict sequential question-to-lyric pipeline.
///
/// Stages run in [`Stage`] order and the first failure ends the run. Every
/// successful run yields exactly one lyric, matched or fallback.
pub struct Pipeline {
    handles: PipelineHandles,
    fallback: FallbackPicker,
}

impl Pipeline {
    pub fn new(handles: PipelineHandles) -> Self {
        Self {
            handles,
            fallback: FallbackPicker::new(),
        }
    }

    pub fn handles(&self) -> &PipelineHandles {
        &self.handles
    }

    /// Runs the pipeline against the wall clock.
    pub async fn ask(
        &self,
        identity: &ClientIdentity,
        body: &[u8],
    ) -> Result<Answer, PipelineError> {
        self.ask_at(identity, body, ratelimit::now_ms()).await
    }

    /// Runs the pipeline with an explicit clock, in epoch milliseconds.
    pub async fn ask_at(
        &self,
        identity: &ClientIdentity,
        body: &[u8],
        now_ms: i64,
    ) -> Result<Answer, PipelineError> {
        let span = tracing::info_span!("ask", identity = %identity);
        let metrics = MetricsSpan::start();
        if let Some(metrics) = &metrics {
            metrics.record_stage(Stage::Identify, &Ok::<_, PipelineError>(()));
        }
        if identity.is_unknown() {
            span.in_scope(|| debug!("no forwarded client address, using shared bucket"));
        }

        let result = self.run(identity, body, now_ms).instrument(span).await;

        // Respond carries the end-to-end latency and the final outcome.
        if let Some(metrics) = &metrics {
            if let Ok(answer) = &result {
                metrics.record_answer(answer.source);
            }
            metrics.record_stage(Stage::Respond, &result);
        }
        result
    }

    async fn run(
        &self,
        identity: &ClientIdentity,
        body: &[u8],
        now_ms: i64,
    ) -> Result<Answer, PipelineError> {
        self.rate_limit(identity, now_ms).await?;

        let request = timed(Stage::ValidateBody, async { AskRequest::from_slice(body) }).await?;

        let question = timed(Stage::Sanitize, async {
            let verdict = canonical::sanitize_question(&request.question);
            if verdict.safe {
                Ok::<_, PipelineError>(canonical::trim_separators(&request.question))
            } else {
                Err(PipelineError::InvalidInput)
            }
        })
        .await?;

        let vector = timed(Stage::Embed, async {
            let embedder = self.handles.embedder.get()?;
            Ok::<_, PipelineError>(embedder.embed(question).await?)
        })
        .await?;

        let candidates = timed(Stage::Retrieve, async {
            let retriever = self.handles.retriever.get()?;
            Ok::<_, PipelineError>(retriever.retrieve(vector.as_slice()).await?)
        })
        .await?;

        timed(Stage::SelectOrFallback, async {
            if candidates.is_empty() {
                return Ok::<_, PipelineError>(self.fallback());
            }
            let selector = self.handles.selector.get()?;
            match selector.select(question, &candidates).await? {
                SelectionOutcome::Chosen(lyric) => Ok(Answer {
                    lyric,
                    source: LyricSource::Matched,
                }),
                SelectionOutcome::NoMatch => Ok(self.fallback()),
            }
        })
        .await
    }

    /// Hourly then daily. A store failure denies the request.
    async fn rate_limit(&self, identity: &ClientIdentity, now_ms: i64) -> Result<(), PipelineError> {
        let metrics = MetricsSpan::start();
        let (stage, result) = match self.handles.limiter.get() {
            Err(err) => (Stage::RateLimitHourly, Err(err)),
            Ok(limiter) => match limiter.check(identity.as_str(), now_ms).await {
                Ok(Verdict::Allowed) => (Stage::RateLimitDaily, Ok(())),
                Ok(Verdict::Limited {
                    window,
                    retry_after_secs,
                }) => {
                    let stage = if window == limiter.config().daily.name {
                        Stage::RateLimitDaily
                    } else {
                        Stage::RateLimitHourly
                    };
                    (stage, Err(PipelineError::RateLimited { retry_after_secs }))
                }
                Err(err) => (Stage::RateLimitHourly, Err(PipelineError::from(err))),
            },
        };
        finish(stage, metrics, result)
    }

    fn fallback(&self) -> Answer {
        Answer {
            lyric: self.fallback.pick().to_string(),
            source: LyricSource::Fallback,
        }
    }
}

async fn timed<T, F>(stage: Stage, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    let metrics = MetricsSpan::start();
    let result = fut.await;
    finish(stage, metrics, result)
}

fn finish<T>(
    stage: Stage,
    metrics: Option<MetricsSpan>,
    result: Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    if let Some(metrics) = metrics {
        metrics.record_stage(stage, &result);
    }
    if let Err(err) = &result {
        match err {
            PipelineError::InvalidInput | PipelineError::RateLimited { .. } => {
                info!(%stage, error = %err, "request stopped");
            }
            PipelineError::UpstreamConfiguration { dependency } => {
                tracing::error!(%stage, %dependency, "dependency not configured");
            }
            PipelineError::UpstreamTimeout { dependency } => {
                warn!(%stage, %dependency, "dependency timed out");
            }
            PipelineError::Upstream {
                dependency,
                message,
            } => {
                warn!(%stage, %dependency, error = %message, "dependency failed");
            }
        }
    }
    result
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("limiter", &self.handles.limiter)
            .field("embedder", &self.handles.embedder)
            .field("retriever", &self.handles.retriever)
            .field("selector", &self.handles.selector)
            .finish()
    }
}

/// Shared, cheaply cloned pipeline.
pub type SharedPipeline = Arc<Pipeline>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_parsing() {
        assert_eq!(
            AskRequest::from_slice(br#"{"question":"hi","extra":1}"#).unwrap(),
            AskRequest {
                question: "hi".into()
            }
        );
        for bad in [&b"{}"[..], b"{\"question\": 3}", b"not json", b"null", b""] {
            assert_eq!(AskRequest::from_slice(bad), Err(PipelineError::InvalidInput));
        }
    }

    #[test]
    fn answer_serializes_only_lyric() {
        let answer = Answer {
            lyric: "Long story short, I survived".into(),
            source: LyricSource::Matched,
        };
        assert_eq!(
            serde_json::to_value(&answer).unwrap(),
            serde_json::json!({ "lyric": "Long story short, I survived" })
        );
    }

    #[test]
    fn stages_are_in_order() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names.first(), Some(&"identify"));
        assert_eq!(names.last(), Some(&"respond"));
        assert_eq!(names.len(), 9);
    }
}
