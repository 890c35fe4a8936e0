use crate::config::{ServerConfig, StoreKind};
use index::CandidateRetriever;
use metrics_exporter_prometheus::PrometheusHandle;
use ratelimit::{CounterStore, MemoryStore, RateLimiter, RedisRestStore};
use selector::{OpenAiChatClient, Selector};
use semantic::{Embedder, EmbeddingClient, EMBEDDING_DIM};
use std::sync::Arc;
use wwts::{Dependency, LazyHandle, Pipeline, PipelineHandles, SharedPipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Question pipeline (shared across requests)
    pub pipeline: SharedPipeline,

    /// Process-local counters when `rate_limit.store = "memory"`
    pub memory_store: Option<Arc<MemoryStore>>,

    /// Prometheus render handle when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// State around an already assembled pipeline.
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            memory_store: None,
            prometheus: None,
        }
    }

    /// Wires lazily built clients from configuration. Nothing is contacted
    /// and no credential is checked until the first request needs it.
    pub fn from_config(config: ServerConfig) -> Self {
        let (handles, memory_store) = build_handles(&config);
        Self {
            memory_store,
            ..Self::new(config, Pipeline::new(handles))
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// One factory per dependency; each validates its own credentials.
pub fn build_handles(config: &ServerConfig) -> (PipelineHandles, Option<Arc<MemoryStore>>) {
    let limiter_cfg = config.limiter_config();
    let (limiter, memory_store) = match config.rate_limit.store {
        StoreKind::Memory => {
            let store = Arc::new(MemoryStore::new());
            let limiter = RateLimiter::new(store.clone(), limiter_cfg);
            (
                LazyHandle::ready(Dependency::RateLimitStore, Arc::new(limiter)),
                Some(store),
            )
        }
        StoreKind::Redis => {
            let redis_cfg = config.redis_config();
            let handle = LazyHandle::new(Dependency::RateLimitStore, move || {
                let store: Arc<dyn CounterStore> = Arc::new(RedisRestStore::new(redis_cfg.clone())?);
                Ok(Arc::new(RateLimiter::new(store, limiter_cfg.clone())))
            });
            (handle, None)
        }
    };

    let embedding_cfg = config.embedding_config();
    let embedder = LazyHandle::new(Dependency::Embedding, move || {
        let client: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(embedding_cfg.clone())?);
        Ok(client)
    });

    let backend = config.index_backend();
    let retriever = LazyHandle::new(Dependency::VectorIndex, move || {
        let index = index::build_index(&backend, EMBEDDING_DIM)?;
        Ok(Arc::new(CandidateRetriever::new(index)))
    });

    let chat_cfg = config.chat_config();
    let selector_cfg = config.selector_config();
    let selector = LazyHandle::new(Dependency::ChatModel, move || {
        let client = OpenAiChatClient::new(chat_cfg.clone())?;
        Ok(Arc::new(Selector::new(Arc::new(client), selector_cfg.clone())))
    });

    (
        PipelineHandles {
            limiter,
            embedder,
            retriever,
            selector,
        },
        memory_store,
    )
}
