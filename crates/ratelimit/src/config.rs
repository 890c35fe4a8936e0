use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix shared by every counter key written by this service.
pub const DEFAULT_KEY_PREFIX: &str = "wwts";

/// One named sliding window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// Window name; part of the counter key and of the 429 diagnostics.
    pub name: String,
    /// Maximum number of events allowed inside the trailing window.
    pub limit: u32,
    /// Length of the trailing window.
    pub window: Duration,
}

impl WindowConfig {
    pub fn new(name: impl Into<String>, limit: u32, window: Duration) -> Self {
        Self {
            name: name.into(),
            limit,
            window,
        }
    }

    /// 5 requests per trailing hour.
    pub fn hourly() -> Self {
        Self::new("hourly", 5, Duration::from_secs(60 * 60))
    }

    /// 75 requests per trailing 24 hours.
    pub fn daily() -> Self {
        Self::new("daily", 75, Duration::from_secs(24 * 60 * 60))
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Both windows plus the key namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub prefix: String,
    pub hourly: WindowConfig,
    pub daily: WindowConfig,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            hourly: WindowConfig::hourly(),
            daily: WindowConfig::daily(),
        }
    }
}

impl RateLimiterConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_hourly(mut self, hourly: WindowConfig) -> Self {
        self.hourly = hourly;
        self
    }

    pub fn with_daily(mut self, daily: WindowConfig) -> Self {
        self.daily = daily;
        self
    }

    /// Counter key for `identity` under `window`.
    pub fn key_for(&self, window: &WindowConfig, identity: &str) -> String {
        format!("{}:{}:{}", self.prefix, window.name, identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_match_published_limits() {
        let cfg = RateLimiterConfig::default();
        assert_eq!(cfg.hourly.limit, 5);
        assert_eq!(cfg.hourly.window, Duration::from_secs(3_600));
        assert_eq!(cfg.daily.limit, 75);
        assert_eq!(cfg.daily.window, Duration::from_secs(86_400));
        assert_eq!(cfg.prefix, "wwts");
    }

    #[test]
    fn keys_are_namespaced_per_window() {
        let cfg = RateLimiterConfig::default();
        assert_eq!(cfg.key_for(&cfg.hourly, "unknown"), "wwts:hourly:unknown");
        assert_eq!(cfg.key_for(&cfg.daily, "10.0.0.1"), "wwts:daily:10.0.0.1");
    }

    #[test]
    fn window_ms_matches_duration() {
        assert_eq!(WindowConfig::hourly().window_ms(), 3_600_000);
    }
}
