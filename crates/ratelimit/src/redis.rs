//! Redis-backed counter store speaking the Upstash-compatible REST protocol.
//!
//! Each check is one `EVAL` of [`SLIDING_LOG_SCRIPT`], so pruning, counting,
//! recording and TTL refresh happen atomically inside Redis. The sorted set
//! key expires after one window of inactivity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::WindowConfig;
use crate::error::RateLimitError;
use crate::store::{CounterStore, RateLimitDecision};

/// Sliding-log check-and-increment.
///
/// `KEYS[1]` counter key; `ARGV` = now_ms, window_ms, limit, member.
/// Returns `{allowed (0|1), reset_at_ms}`.
pub const SLIDING_LOG_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
  redis.call('ZADD', key, now, ARGV[4])
  allowed = 1
end
redis.call('PEXPIRE', key, window)
local reset = now + window
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
  reset = tonumber(oldest[2]) + window
end
return {allowed, reset}
"#;

/// Connection settings for [`RedisRestStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedisRestConfig {
    /// REST endpoint, e.g. `https://eu1-example.upstash.io`.
    pub url: String,
    /// Bearer token for the REST endpoint.
    pub token: String,
    /// Deadline for one `EVAL` round trip.
    pub timeout: Duration,
}

impl RedisRestConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct RedisRestStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for RedisRestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRestStore")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl RedisRestStore {
    /// Validates the configuration and builds the HTTP client.
    pub fn new(config: RedisRestConfig) -> Result<Self, RateLimitError> {
        let url = config.url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(RateLimitError::InvalidConfig("REDIS_URL is not set".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RateLimitError::InvalidConfig(
                "REDIS_URL must be an http(s) REST endpoint".into(),
            ));
        }
        if config.token.trim().is_empty() {
            return Err(RateLimitError::InvalidConfig("REDIS_TOKEN is not set".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| RateLimitError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            token: config.token,
        })
    }

    fn command(key: &str, window: &WindowConfig, now_ms: i64) -> Value {
        let member = format!("{now_ms}-{:016x}", fastrand::u64(..));
        json!([
            "EVAL",
            SLIDING_LOG_SCRIPT,
            "1",
            key,
            now_ms.to_string(),
            window.window_ms().to_string(),
            window.limit.to_string(),
            member,
        ])
    }
}

#[async_trait]
impl CounterStore for RedisRestStore {
    async fn limit(
        &self,
        key: &str,
        window: &WindowConfig,
        now_ms: i64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&Self::command(key, window, now_ms))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RateLimitError::Store(format!("HTTP error {status}: {body}")));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| RateLimitError::MalformedReply(format!("invalid JSON: {e}")))?;
        parse_reply(reply)
    }
}

fn parse_reply(reply: Value) -> Result<RateLimitDecision, RateLimitError> {
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Err(RateLimitError::Store(error.to_string()));
    }

    let result = reply
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| RateLimitError::MalformedReply("missing `result` array".into()))?;

    match result.as_slice() {
        [allowed, reset] => {
            let allowed = as_i64(allowed)
                .ok_or_else(|| RateLimitError::MalformedReply("non-numeric allowed flag".into()))?;
            let reset_at_ms = as_i64(reset)
                .ok_or_else(|| RateLimitError::MalformedReply("non-numeric reset".into()))?;
            Ok(RateLimitDecision {
                allowed: allowed == 1,
                reset_at_ms,
            })
        }
        other => Err(RateLimitError::MalformedReply(format!(
            "expected 2 values, got {}",
            other.len()
        ))),
    }
}

// Upstash may return integers as JSON numbers or as strings.
fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_credentials() {
        let err = RedisRestStore::new(RedisRestConfig::new("", "tok")).unwrap_err();
        assert!(err.to_string().contains("REDIS_URL"));

        let err = RedisRestStore::new(RedisRestConfig::new("https://r.example", " ")).unwrap_err();
        assert!(err.to_string().contains("REDIS_TOKEN"));
    }

    #[test]
    fn rejects_non_http_url() {
        let err = RedisRestStore::new(RedisRestConfig::new("redis://r.example:6379", "tok"))
            .unwrap_err();
        assert!(matches!(err, RateLimitError::InvalidConfig(_)));
    }

    #[test]
    fn command_carries_window_arguments() {
        let cmd = RedisRestStore::command("wwts:hourly:x", &WindowConfig::hourly(), 42);
        let args = cmd.as_array().unwrap();
        assert_eq!(args[0], "EVAL");
        assert_eq!(args[2], "1");
        assert_eq!(args[3], "wwts:hourly:x");
        assert_eq!(args[4], "42");
        assert_eq!(args[5], "3600000");
        assert_eq!(args[6], "5");
        assert!(args[7].as_str().unwrap().starts_with("42-"));
    }

    #[test]
    fn parses_numeric_and_string_replies() {
        let d = parse_reply(json!({ "result": [1, 1000] })).unwrap();
        assert_eq!(d, RateLimitDecision { allowed: true, reset_at_ms: 1000 });

        let d = parse_reply(json!({ "result": ["0", "2000"] })).unwrap();
        assert_eq!(d, RateLimitDecision { allowed: false, reset_at_ms: 2000 });
    }

    #[test]
    fn surfaces_store_errors() {
        let err = parse_reply(json!({ "error": "NOSCRIPT" })).unwrap_err();
        assert_eq!(err, RateLimitError::Store("NOSCRIPT".into()));

        let err = parse_reply(json!({ "result": [1] })).unwrap_err();
        assert!(matches!(err, RateLimitError::MalformedReply(_)));
    }
}
