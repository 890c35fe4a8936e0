use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::SelectorError;
use crate::types::ChatMessage;

/// Chat model used for selection.
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// A generative model that completes a message sequence.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, SelectorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// OpenAI-compatible API root, without `/chat/completions`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: CHAT_MODEL.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ChatConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Single-shot `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(cfg: ChatConfig) -> Result<Self, SelectorError> {
        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SelectorError::InvalidConfig("OPENAI_API_KEY is not set".into()))?
            .to_string();
        if cfg.model.trim().is_empty() {
            return Err(SelectorError::InvalidConfig("chat model is empty".into()));
        }
        if cfg.timeout.is_zero() {
            return Err(SelectorError::InvalidConfig(
                "chat timeout must be non-zero".into(),
            ));
        }

        let base = cfg.base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SelectorError::InvalidConfig(format!(
                "chat base_url must be http(s), got {base}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| SelectorError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{base}/chat/completions"),
            api_key,
            model: cfg.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, SelectorError> {
        let started = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let res = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "chat request failed"))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SelectorError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| SelectorError::MalformedResponse(format!("invalid JSON: {e}")))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                SelectorError::MalformedResponse("missing choices[0].message.content".into())
            })?
            .to_string();

        debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(content)
    }
}
