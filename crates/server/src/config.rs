use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use index::{BackendConfig, PostgrestConfig};
use ratelimit::{RateLimiterConfig, RedisRestConfig, WindowConfig};
use selector::{ChatConfig, SelectorConfig};
use semantic::EmbeddingConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level / `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub corpus: CorpusSettings,

    #[serde(default)]
    pub selector: SelectorSettings,
}

/// Credentials and deadlines shared by the embedding and chat clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_timeout_secs: u64,
    pub chat_timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_timeout_secs: 10,
            chat_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Upstash-compatible Redis REST endpoint.
    Redis,
    /// Process-local counters. Single instance only.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub store: StoreKind,
    pub redis_url: Option<String>,
    #[serde(skip_serializing)]
    pub redis_token: Option<String>,
    pub timeout_secs: u64,
    pub prefix: String,
    pub hourly_limit: u32,
    pub daily_limit: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            store: StoreKind::Redis,
            redis_url: None,
            redis_token: None,
            timeout_secs: 5,
            prefix: ratelimit::DEFAULT_KEY_PREFIX.to_string(),
            hourly_limit: 5,
            daily_limit: 75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    /// pgvector similarity function behind PostgREST (Supabase).
    Postgrest,
    /// JSON corpus file scanned in process.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub backend: CorpusKind,
    pub corpus_path: Option<PathBuf>,
    pub supabase_url: Option<String>,
    #[serde(skip_serializing)]
    pub supabase_key: Option<String>,
    pub rpc_function: String,
    pub timeout_secs: u64,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            backend: CorpusKind::Postgrest,
            corpus_path: None,
            supabase_url: None,
            supabase_key: None,
            rpc_function: "match_lyrics".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorSettings {
    /// Serve a fallback when the model's pick is not one of the candidates.
    pub require_candidate_match: bool,
}

/// Which dependencies have credentials, as booleans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub openai: bool,
    pub rate_limit_store: bool,
    pub vector_index: bool,
}

impl Readiness {
    pub fn all(&self) -> bool {
        self.openai && self.rate_limit_store && self.vector_index
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            openai: OpenAiSettings::default(),
            rate_limit: RateLimitSettings::default(),
            corpus: CorpusSettings::default(),
            selector: SelectorSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file and
    /// `WWTS_SERVER__*` environment variables, then fill empty credentials
    /// from the conventional variables (`OPENAI_API_KEY`, `REDIS_URL`, ...).
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("WWTS_SERVER").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Fills credentials the structured config left empty.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, name: &str| {
            if !slot.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                *slot = lookup(name).filter(|v| !v.trim().is_empty());
            }
        };
        fill(&mut self.openai.api_key, "OPENAI_API_KEY");
        fill(&mut self.rate_limit.redis_url, "REDIS_URL");
        fill(&mut self.rate_limit.redis_token, "REDIS_TOKEN");
        fill(&mut self.corpus.supabase_url, "SUPABASE_URL");
        fill(&mut self.corpus.supabase_key, "SUPABASE_KEY");
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }

    pub fn readiness(&self) -> Readiness {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        Readiness {
            openai: present(&self.openai.api_key),
            rate_limit_store: match self.rate_limit.store {
                StoreKind::Memory => true,
                StoreKind::Redis => {
                    present(&self.rate_limit.redis_url) && present(&self.rate_limit.redis_token)
                }
            },
            vector_index: self.index_backend().is_configured(),
        }
    }

    pub fn limiter_config(&self) -> RateLimiterConfig {
        let rl = &self.rate_limit;
        RateLimiterConfig::default()
            .with_prefix(rl.prefix.clone())
            .with_hourly(WindowConfig::hourly().with_limit(rl.hourly_limit))
            .with_daily(WindowConfig::daily().with_limit(rl.daily_limit))
    }

    pub fn redis_config(&self) -> RedisRestConfig {
        let rl = &self.rate_limit;
        RedisRestConfig::new(
            rl.redis_url.clone().unwrap_or_default(),
            rl.redis_token.clone().unwrap_or_default(),
        )
        .with_timeout(Duration::from_secs(rl.timeout_secs))
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        let mut cfg = EmbeddingConfig::default()
            .with_base_url(self.openai.base_url.clone())
            .with_timeout(Duration::from_secs(self.openai.embedding_timeout_secs));
        cfg.api_key = self.openai.api_key.clone();
        cfg
    }

    pub fn chat_config(&self) -> ChatConfig {
        let mut cfg = ChatConfig::default()
            .with_base_url(self.openai.base_url.clone())
            .with_timeout(Duration::from_secs(self.openai.chat_timeout_secs));
        cfg.api_key = self.openai.api_key.clone();
        cfg
    }

    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig::default().with_candidate_match(self.selector.require_candidate_match)
    }

    pub fn index_backend(&self) -> BackendConfig {
        let c = &self.corpus;
        match c.backend {
            CorpusKind::Memory => BackendConfig::memory(c.corpus_path.clone().unwrap_or_default()),
            CorpusKind::Postgrest => BackendConfig::postgrest(PostgrestConfig {
                url: c.supabase_url.clone().unwrap_or_default(),
                key: c.supabase_key.clone(),
                function: c.rpc_function.clone(),
                timeout: Duration::from_secs(c.timeout_secs),
            }),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_kb() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size(), 16 * 1024);
        assert_eq!(cfg.rate_limit.hourly_limit, 5);
        assert_eq!(cfg.rate_limit.daily_limit, 75);
        assert_eq!(cfg.openai.chat_timeout_secs, 10);
        assert!(!cfg.selector.require_candidate_match);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn env_fallbacks_fill_only_empty_slots() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-env"),
            ("REDIS_URL", "https://redis.example.com"),
            ("REDIS_TOKEN", "  "),
            ("SUPABASE_URL", "https://db.example.com"),
            ("SUPABASE_KEY", "service"),
        ]);
        let mut cfg = ServerConfig::default();
        cfg.corpus.supabase_url = Some("https://configured.example.com".into());
        cfg.apply_env_fallbacks(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.openai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(cfg.rate_limit.redis_url.as_deref(), Some("https://redis.example.com"));
        assert_eq!(cfg.rate_limit.redis_token, None);
        assert_eq!(
            cfg.corpus.supabase_url.as_deref(),
            Some("https://configured.example.com")
        );
    }

    #[test]
    fn readiness_reports_booleans() {
        let mut cfg = ServerConfig::default();
        assert_eq!(
            cfg.readiness(),
            Readiness {
                openai: false,
                rate_limit_store: false,
                vector_index: false
            }
        );

        cfg.openai.api_key = Some("sk-test".into());
        cfg.rate_limit.store = StoreKind::Memory;
        cfg.corpus.backend = CorpusKind::Memory;
        cfg.corpus.corpus_path = Some("lyrics.json".into());
        assert!(cfg.readiness().all());
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut cfg = ServerConfig::default();
        cfg.openai.api_key = Some("sk-secret".into());
        cfg.rate_limit.redis_token = Some("redis-secret".into());
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn limiter_config_uses_settings() {
        let mut cfg = ServerConfig::default();
        cfg.rate_limit.hourly_limit = 2;
        let lc = cfg.limiter_config();
        assert_eq!(lc.hourly.limit, 2);
        assert_eq!(lc.daily.limit, 75);
        assert_eq!(lc.prefix, "wwts");
    }
}
