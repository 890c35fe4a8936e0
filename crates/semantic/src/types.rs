use serde::Serialize;

use crate::config::{EMBEDDING_DIM, EMBEDDING_MODEL};
use crate::error::SemanticError;

/// A vector produced by [`EMBEDDING_MODEL`]. Always [`EMBEDDING_DIM`] long.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Wraps `values`, rejecting any length other than [`EMBEDDING_DIM`].
    pub fn new(values: Vec<f32>) -> Result<Self, SemanticError> {
        if values.len() != EMBEDDING_DIM {
            return Err(SemanticError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SemanticError::InvalidResponse(
                "embedding contains non-finite values".into(),
            ));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn model(&self) -> &'static str {
        EMBEDDING_MODEL
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
