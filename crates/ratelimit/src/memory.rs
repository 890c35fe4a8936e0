use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;

use crate::config::WindowConfig;
use crate::error::RateLimitError;
use crate::store::{CounterStore, RateLimitDecision};

/// Process-local sliding log.
///
/// The per-key `DashMap` entry guard is held for the whole
/// check-and-increment, which makes each call atomic for its key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    logs: DashMap<String, VecDeque<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events currently counted for `key`, without recording one.
    pub fn count(&self, key: &str, window: &WindowConfig, now_ms: i64) -> usize {
        let cutoff = now_ms.saturating_sub(window.window_ms());
        self.logs
            .get(key)
            .map(|log| log.iter().filter(|&&ts| ts > cutoff).count())
            .unwrap_or(0)
    }

    /// Drops keys whose newest event is older than `max_window`.
    pub fn evict_idle(&self, max_window: &WindowConfig, now_ms: i64) {
        let cutoff = now_ms.saturating_sub(max_window.window_ms());
        self.logs
            .retain(|_, log| log.back().is_some_and(|&newest| newest > cutoff));
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn limit(
        &self,
        key: &str,
        window: &WindowConfig,
        now_ms: i64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let window_ms = window.window_ms();
        let cutoff = now_ms.saturating_sub(window_ms);

        let mut log = self.logs.entry(key.to_string()).or_default();
        log.retain(|&ts| ts > cutoff);

        let allowed = log.len() < window.limit as usize;
        if allowed {
            // Keep the log sorted even if callers hand us slightly skewed clocks.
            let at = log.partition_point(|&ts| ts <= now_ms);
            log.insert(at, now_ms);
        }

        let reset_at_ms = log
            .front()
            .map(|&oldest| oldest.saturating_add(window_ms))
            .unwrap_or_else(|| now_ms.saturating_add(window_ms));

        Ok(RateLimitDecision {
            allowed,
            reset_at_ms,
        })
    }
}
