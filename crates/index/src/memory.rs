use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::Path;

use crate::{Candidate, IndexError, VectorIndex};

/// Chunk size for the auto-vectorized dot product.
const SIMD_CHUNK_SIZE: usize = 32;

/// One corpus row as written by the offline embedding job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LyricEntry {
    #[serde(alias = "lyric_text")]
    pub text: String,
    pub embedding: Vec<f32>,
}

impl LyricEntry {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }
}

/// In-process corpus searched by linear cosine scan.
///
/// The lyric corpus is a few dozen entries, so brute force is exact and
/// cheap. Ties keep corpus order.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    entries: Vec<LyricEntry>,
    dim: usize,
}

impl MemoryIndex {
    /// Builds an index, rejecting any entry whose embedding is not `dim` long.
    pub fn from_entries(entries: Vec<LyricEntry>, dim: usize) -> Result<Self, IndexError> {
        if dim == 0 {
            return Err(IndexError::InvalidConfig("dimension must be non-zero".into()));
        }
        for entry in &entries {
            if entry.embedding.len() != dim {
                return Err(IndexError::Corpus(format!(
                    "entry {:?} has {} dimensions, expected {dim}",
                    entry.text,
                    entry.embedding.len()
                )));
            }
            if entry.text.trim().is_empty() {
                return Err(IndexError::Corpus("entry with empty lyric text".into()));
            }
        }
        Ok(Self { entries, dim })
    }

    /// Parses a JSON array of `{"text", "embedding"}` objects.
    pub fn from_json_str(json: &str, dim: usize) -> Result<Self, IndexError> {
        let entries: Vec<LyricEntry> =
            serde_json::from_str(json).map_err(|e| IndexError::Corpus(e.to_string()))?;
        Self::from_entries(entries, dim)
    }

    pub fn from_json_file(path: impl AsRef<Path>, dim: usize) -> Result<Self, IndexError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw, dim)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn scan(&self, vector: &[f32], min_score: f32, k: usize) -> Vec<Candidate> {
        let mut hits: Vec<Candidate> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = cosine_similarity(vector, &entry.embedding);
                (score >= min_score).then(|| Candidate::new(entry.text.clone(), score))
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(k);
        hits
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn nearest(
        &self,
        vector: &[f32],
        min_score: f32,
        k: usize,
    ) -> Result<Vec<Candidate>, IndexError> {
        if vector.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(self.scan(vector, min_score, k))
    }
}

/// Cosine similarity of two equal-length vectors; `0.0` when either is empty,
/// zero, or the lengths differ.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (ca, cb) in a.chunks(SIMD_CHUNK_SIZE).zip(b.chunks(SIMD_CHUNK_SIZE)) {
        let (d, na, nb) = chunk_terms(ca, cb);
        dot += d;
        norm_a += na;
        norm_b += nb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[inline(always)]
fn chunk_terms(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    a.iter()
        .zip(b.iter())
        .fold((0.0, 0.0, 0.0), |(d, na, nb), (&x, &y)| {
            (d + x * y, na + x * x, nb + y * y)
        })
}
