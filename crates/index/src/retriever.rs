use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::{Candidate, IndexError, VectorIndex, MAX_CANDIDATES, SIMILARITY_THRESHOLD};

/// Fetches selector candidates and guarantees their shape: every score at
/// least [`SIMILARITY_THRESHOLD`], best first, never more than
/// [`MAX_CANDIDATES`].
#[derive(Clone)]
pub struct CandidateRetriever {
    index: Arc<dyn VectorIndex>,
    threshold: f32,
    limit: usize,
}

impl CandidateRetriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            threshold: SIMILARITY_THRESHOLD,
            limit: MAX_CANDIDATES,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// An empty result is a normal outcome, not an error.
    pub async fn retrieve(&self, vector: &[f32]) -> Result<Vec<Candidate>, IndexError> {
        let raw = self.index.nearest(vector, self.threshold, self.limit).await?;
        let returned = raw.len();
        let candidates = enforce(raw, self.threshold, self.limit);
        debug!(
            returned,
            kept = candidates.len(),
            top_score = candidates.first().map(|c| c.score),
            "candidates retrieved"
        );
        Ok(candidates)
    }
}

/// Filter, stable sort (descending, NaN last), truncate.
fn enforce(mut candidates: Vec<Candidate>, threshold: f32, limit: usize) -> Vec<Candidate> {
    candidates.retain(|c| c.score.is_finite() && c.score >= threshold);
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(limit);
    candidates
}
