use std::sync::Arc;

use crate::config::{RateLimiterConfig, WindowConfig};
use crate::error::RateLimitError;
use crate::store::CounterStore;

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whole seconds until `reset_at_ms`, rounded up.
pub fn retry_after_secs(reset_at_ms: i64, now_ms: i64) -> u64 {
    let remaining = reset_at_ms.saturating_sub(now_ms).max(0) as u64;
    remaining.div_ceil(1000)
}

/// Result of checking both windows for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Limited {
        /// Name of the window that denied the request.
        window: String,
        retry_after_secs: u64,
    },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Hourly-then-daily limiter over a shared store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimiterConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Checks `identity` against the hourly window, then the daily one.
    ///
    /// The daily window is only consulted when the hourly one allows.
    pub async fn check(&self, identity: &str, now_ms: i64) -> Result<Verdict, RateLimitError> {
        if let Some(limited) = self.check_window(&self.config.hourly, identity, now_ms).await? {
            return Ok(limited);
        }
        if let Some(limited) = self.check_window(&self.config.daily, identity, now_ms).await? {
            return Ok(limited);
        }
        Ok(Verdict::Allowed)
    }

    async fn check_window(
        &self,
        window: &WindowConfig,
        identity: &str,
        now_ms: i64,
    ) -> Result<Option<Verdict>, RateLimitError> {
        let key = self.config.key_for(window, identity);
        let decision = self.store.limit(&key, window, now_ms).await?;

        // A reset at or before `now` means the window has already rolled over.
        if decision.allowed || decision.reset_at_ms <= now_ms {
            return Ok(None);
        }

        let retry_after_secs = retry_after_secs(decision.reset_at_ms, now_ms);
        tracing::debug!(
            window = %window.name,
            retry_after_secs,
            "rate limit window exhausted"
        );
        Ok(Some(Verdict::Limited {
            window: window.name.clone(),
            retry_after_secs,
        }))
    }
}
