use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WindowConfig;
use crate::error::RateLimitError;

/// Answer from a single check-and-increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// When the oldest counted event leaves the window.
    #[serde(rename = "resetAtEpochMs")]
    pub reset_at_ms: i64,
}

/// Shared counter store.
///
/// `limit` must be atomic with respect to concurrent callers using the same
/// key: count the events in the trailing window, record a new one only when
/// the count is below `window.limit`, and report the reset time. Denied
/// events are not recorded.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn limit(
        &self,
        key: &str,
        window: &WindowConfig,
        now_ms: i64,
    ) -> Result<RateLimitDecision, RateLimitError>;
}
