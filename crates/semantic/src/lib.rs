//! WWTS semantic layer.
//!
//! Turns a sanitized question into the fixed-length vector the lyric corpus
//! was embedded with. There is exactly one model: [`EMBEDDING_MODEL`] at
//! [`EMBEDDING_DIM`] dimensions, matching the corpus.
//!
//! Calls are single-shot. A failed or slow request surfaces immediately as
//! a [`SemanticError`].
//!
//! ```no_run
//! use semantic::{EmbeddingClient, EmbeddingConfig, Embedder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = EmbeddingConfig::default().with_api_key("sk-...");
//!     let client = EmbeddingClient::new(cfg).expect("valid config");
//!     let vector = client.embed("Will this feeling ever pass?").await.unwrap();
//!     assert_eq!(vector.len(), semantic::EMBEDDING_DIM);
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
mod normalize;

pub use crate::api::EmbeddingClient;
pub use crate::config::{EmbeddingConfig, EMBEDDING_DIM, EMBEDDING_MODEL};
pub use crate::error::SemanticError;
pub use crate::types::EmbeddingVector;

use async_trait::async_trait;

/// Anything that can embed one question with the pinned model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, SemanticError>;
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        self.embed_text(text).await
    }
}
