use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::{Candidate, IndexError, VectorIndex};

/// Connection settings for a pgvector similarity function exposed by PostgREST.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub key: Option<String>,
    /// Name of the SQL function taking `query_embedding`, `match_threshold`
    /// and `match_count`.
    pub function: String,
    pub timeout: Duration,
}

impl Default for PostgrestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: None,
            function: "match_lyrics".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    lyric_text: String,
    similarity: f32,
}

/// Remote corpus queried through `POST {url}/rest/v1/rpc/{function}`.
#[derive(Debug, Clone)]
pub struct PostgrestIndex {
    http: reqwest::Client,
    endpoint: String,
    key: String,
}

impl PostgrestIndex {
    pub fn new(cfg: PostgrestConfig) -> Result<Self, IndexError> {
        let url = cfg.url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(IndexError::InvalidConfig("SUPABASE_URL is not set".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(IndexError::InvalidConfig(format!(
                "SUPABASE_URL must be http(s), got {url}"
            )));
        }
        let key = cfg
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| IndexError::InvalidConfig("SUPABASE_KEY is not set".into()))?
            .to_string();
        if cfg.function.trim().is_empty() {
            return Err(IndexError::InvalidConfig("rpc function name is empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| IndexError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{url}/rest/v1/rpc/{}", cfg.function.trim()),
            key,
        })
    }
}

#[async_trait]
impl VectorIndex for PostgrestIndex {
    async fn nearest(
        &self,
        vector: &[f32],
        min_score: f32,
        k: usize,
    ) -> Result<Vec<Candidate>, IndexError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(&json!({
                "query_embedding": vector,
                "match_threshold": min_score,
                "match_count": k,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Backend(format!("HTTP {status}: {body}")));
        }

        let rows: Vec<MatchRow> = response
            .json()
            .await
            .map_err(|e| IndexError::Decode(e.to_string()))?;
        debug!(rows = rows.len(), "similarity rpc returned");

        Ok(rows
            .into_iter()
            .map(|row| Candidate::new(row.lyric_text, row.similarity))
            .collect())
    }
}
