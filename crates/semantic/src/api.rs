use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{EmbeddingConfig, EMBEDDING_MODEL};
use crate::error::SemanticError;
use crate::normalize::l2_normalize_in_place;
use crate::types::EmbeddingVector;

/// OpenAI-compatible embedding client. One request per question, never retried.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    normalize: bool,
}

impl EmbeddingClient {
    /// Builds a client, failing when the key is missing or blank.
    pub fn new(cfg: EmbeddingConfig) -> Result<Self, SemanticError> {
        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SemanticError::InvalidConfig("OPENAI_API_KEY is not set".into()))?
            .to_string();

        if cfg.timeout.is_zero() {
            return Err(SemanticError::InvalidConfig(
                "embedding timeout must be non-zero".into(),
            ));
        }
        let url = cfg.embeddings_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SemanticError::InvalidConfig(format!(
                "embedding base_url must be http(s), got {}",
                cfg.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            url,
            api_key,
            normalize: cfg.normalize,
        })
    }

    pub fn model(&self) -> &'static str {
        EMBEDDING_MODEL
    }

    pub(crate) async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        let started = Instant::now();
        let payload = json!({ "model": EMBEDDING_MODEL, "input": text });

        let value = self.send(payload).await.inspect_err(|err| {
            warn!(error = %err, "embedding request failed");
        })?;

        let mut vectors = parse_embeddings_from_value(value)?;
        if vectors.len() != 1 {
            return Err(SemanticError::InvalidResponse(format!(
                "expected exactly one embedding, got {}",
                vectors.len()
            )));
        }
        let mut values = vectors.remove(0);
        if self.normalize {
            l2_normalize_in_place(&mut values);
        }
        let vector = EmbeddingVector::new(values)?;

        debug!(
            model = EMBEDDING_MODEL,
            latency_ms = started.elapsed().as_millis() as u64,
            "question embedded"
        );
        Ok(vector)
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::InvalidResponse(format!("invalid JSON: {e}")))
    }
}

/// Accepts both the OpenAI `data[].embedding` envelope and a bare
/// `embeddings` array.
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    let Value::Object(mut map) = value else {
        return Err(SemanticError::InvalidResponse(
            "embedding response must be a JSON object".into(),
        ));
    };

    if let Some(embeddings) = map.remove("embeddings") {
        return parse_embedding_collection(embeddings);
    }

    match map.remove("data") {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(mut obj) => obj
                    .remove("embedding")
                    .ok_or_else(|| {
                        SemanticError::InvalidResponse("missing `embedding` in data item".into())
                    })
                    .and_then(parse_embedding_vector),
                _ => Err(SemanticError::InvalidResponse(
                    "unexpected entry inside `data` array".into(),
                )),
            })
            .collect(),
        _ => Err(SemanticError::InvalidResponse(
            "unsupported embedding response shape".into(),
        )),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_array) && !items.is_empty() => {
            items.into_iter().map(parse_embedding_vector).collect()
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    SemanticError::InvalidResponse("non-finite embedding value".into())
                }),
                other => Err(SemanticError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::InvalidResponse(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}
