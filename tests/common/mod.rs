//! Deterministic stand-ins for the pipeline's network dependencies.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wwts::index::{CandidateRetriever, LyricEntry, MemoryIndex};
use wwts::ratelimit::{CounterStore, MemoryStore, RateLimiter, RateLimiterConfig};
use wwts::selector::{ChatMessage, ChatModel, Selector, SelectorConfig, SelectorError};
use wwts::semantic::{Embedder, EmbeddingVector, SemanticError, EMBEDDING_DIM};
use wwts::{Dependency, LazyHandle, Pipeline, PipelineHandles};

pub const HEALING_LYRIC: &str = "This is me trying";
pub const SURVIVAL_LYRIC: &str = "Long story short, I survived";

/// Unit vector along `axis`.
pub fn axis(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[axis] = 1.0;
    v
}

/// Maps questions to axes by keyword; anything else lands on an empty axis.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let dir = if lower.contains("feeling") || lower.contains("heal") {
            axis(0)
        } else if lower.contains("survive") {
            axis(1)
        } else if lower.contains("programming") {
            // Close enough to the healing lyric to be retrieved.
            let mut v = axis(0);
            v[2] = 0.5;
            v
        } else {
            axis(EMBEDDING_DIM - 1)
        };
        EmbeddingVector::new(dir)
    }
}

pub fn corpus() -> MemoryIndex {
    MemoryIndex::from_entries(
        vec![
            LyricEntry {
                text: HEALING_LYRIC.into(),
                embedding: axis(0),
            },
            LyricEntry {
                text: SURVIVAL_LYRIC.into(),
                embedding: axis(1),
            },
        ],
        EMBEDDING_DIM,
    )
    .unwrap()
}

/// Replies with a fixed string and records what it was shown.
pub struct ScriptedModel {
    pub reply: Result<String, SelectorError>,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Vec<ChatMessage>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: SelectorError) -> Self {
        Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, SelectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = messages.to_vec();
        self.reply.clone()
    }
}

/// A rate limit store that is always down.
pub struct BrokenStore;

#[async_trait]
impl CounterStore for BrokenStore {
    async fn limit(
        &self,
        _key: &str,
        _window: &wwts::ratelimit::WindowConfig,
        _now_ms: i64,
    ) -> Result<wwts::ratelimit::RateLimitDecision, wwts::ratelimit::RateLimitError> {
        Err(wwts::ratelimit::RateLimitError::Store("connection refused".into()))
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<MemoryStore>,
    pub limiter: Arc<RateLimiter>,
    pub embedder: Arc<KeywordEmbedder>,
    pub retriever: Arc<CandidateRetriever>,
    pub model: Arc<ScriptedModel>,
    pub selector_builds: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(model: ScriptedModel) -> Self {
        Self::with_limits(model, RateLimiterConfig::default())
    }

    pub fn with_limits(model: ScriptedModel, limits: RateLimiterConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let limiter = Arc::new(RateLimiter::new(store.clone(), limits));
        let embedder = Arc::new(KeywordEmbedder::default());
        let retriever = Arc::new(CandidateRetriever::new(Arc::new(corpus())));
        let model = Arc::new(model);
        let selector_builds = Arc::new(AtomicUsize::new(0));

        let mut harness = Self {
            pipeline: Pipeline::new(empty_handles()),
            store,
            limiter,
            embedder,
            retriever,
            model,
            selector_builds,
        };
        harness.pipeline = Pipeline::new(harness.handles());
        harness
    }

    /// Fresh handles over the shared fakes, for building variant pipelines.
    pub fn handles(&self) -> PipelineHandles {
        let embedder: Arc<dyn Embedder> = self.embedder.clone();
        let selector = {
            let model = self.model.clone();
            let builds = self.selector_builds.clone();
            LazyHandle::new(Dependency::ChatModel, move || {
                builds.fetch_add(1, Ordering::SeqCst);
                let model: Arc<dyn ChatModel> = model.clone();
                Ok(Arc::new(Selector::new(model, SelectorConfig::default())))
            })
        };

        PipelineHandles {
            limiter: LazyHandle::ready(Dependency::RateLimitStore, self.limiter.clone()),
            embedder: LazyHandle::ready(Dependency::Embedding, embedder),
            retriever: LazyHandle::ready(Dependency::VectorIndex, self.retriever.clone()),
            selector,
        }
    }

    pub fn embed_calls(&self) -> usize {
        self.embedder.calls.load(Ordering::SeqCst)
    }

    pub fn model_calls(&self) -> usize {
        self.model.calls.load(Ordering::SeqCst)
    }
}

/// Handles whose every build fails, as with no credentials at all.
pub fn empty_handles() -> PipelineHandles {
    PipelineHandles {
        limiter: LazyHandle::new(Dependency::RateLimitStore, || Err("not configured".into())),
        embedder: LazyHandle::new(Dependency::Embedding, || Err("not configured".into())),
        retriever: LazyHandle::new(Dependency::VectorIndex, || Err("not configured".into())),
        selector: LazyHandle::new(Dependency::ChatModel, || Err("not configured".into())),
    }
}

pub fn body(question: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "question": question })).unwrap()
}
