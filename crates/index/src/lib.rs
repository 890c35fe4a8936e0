//! # WWTS Index
//!
//! Candidate retrieval over the pre-embedded lyric corpus. The corpus is a
//! list of `(lyric text, embedding)` pairs written by an offline job that
//! uses the same embedding model as the request path.
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: any store implementing [`VectorIndex`]. Two are
//!   provided:
//!   - [`MemoryIndex`], a brute-force cosine scan over a JSON corpus file,
//!     used for local development and tests.
//!   - [`PostgrestIndex`], a pgvector similarity function called over
//!     PostgREST (the hosted deployment).
//! - **Invariant enforcement**: [`CandidateRetriever`] re-applies the
//!   threshold, ordering and cap to whatever a backend returns, so a
//!   misconfigured remote function cannot leak a fourth or sub-threshold
//!   candidate downstream.
//!
//! ## Example Usage
//!
//! ```
//! use index::{CandidateRetriever, LyricEntry, MemoryIndex};
//! use std::sync::Arc;
//!
//! let corpus = MemoryIndex::from_entries(
//!     vec![
//!         LyricEntry::new("It's me, hi, I'm the problem, it's me", vec![1.0, 0.0]),
//!         LyricEntry::new("Long story short, I survived", vec![0.0, 1.0]),
//!     ],
//!     2,
//! )
//! .unwrap();
//! assert_eq!(corpus.len(), 2);
//! let _retriever = CandidateRetriever::new(Arc::new(corpus));
//! ```

mod backend;
mod memory;
mod postgrest;
mod retriever;

pub use backend::{build_index, BackendConfig};
pub use memory::{cosine_similarity, LyricEntry, MemoryIndex};
pub use postgrest::{PostgrestConfig, PostgrestIndex};
pub use retriever::CandidateRetriever;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum cosine similarity a lyric needs to be offered to the selector.
pub const SIMILARITY_THRESHOLD: f32 = 0.70;

/// Upper bound on candidates handed to the selector.
pub const MAX_CANDIDATES: usize = 3;

/// One retrieved lyric with its similarity to the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    #[serde(rename = "similarityScore")]
    pub score: f32,
}

impl Candidate {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Nearest-neighbour lookup over the lyric corpus.
///
/// Implementations return at most `k` entries scoring at least `min_score`,
/// best first. [`CandidateRetriever`] does not rely on that contract.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn nearest(
        &self,
        vector: &[f32],
        min_score: f32,
        k: usize,
    ) -> Result<Vec<Candidate>, IndexError>;
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("corpus load failed: {0}")]
    Corpus(String),
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index query timed out")]
    Timeout,
    #[error("index backend error: {0}")]
    Backend(String),
    #[error("invalid index response: {0}")]
    Decode(String),
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Corpus(e.to_string())
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexError::Timeout
        } else {
            IndexError::Backend(e.to_string())
        }
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        IndexError::Backend(err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, IndexError::Timeout)
    }

    pub fn is_config(&self) -> bool {
        matches!(self, IndexError::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_serializes_with_score_name() {
        let json = serde_json::to_value(Candidate::new("Shake it off", 0.8)).unwrap();
        assert_eq!(json["text"], "Shake it off");
        assert!((json["similarityScore"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn reqwest_timeouts_are_classified() {
        assert!(IndexError::Timeout.is_timeout());
        assert!(!IndexError::backend("boom").is_timeout());
        assert!(IndexError::InvalidConfig("x".into()).is_config());
    }
}
