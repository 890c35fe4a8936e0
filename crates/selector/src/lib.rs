//! # WWTS Selector (`selector`)
//!
//! ## Purpose
//!
//! `selector` sits after candidate retrieval. It asks a chat model to pick
//! the one retrieved lyric that fits the emotional content of a question, or
//! to answer with the [`NO_MATCH_SENTINEL`]. When nothing fits, the
//! [`FallbackPicker`] supplies an on-brand non-answer so the caller always
//! has a lyric to show.
//!
//! ## Core Types
//!
//! - [`ChatModel`]: the generative-model seam (`complete(messages, temperature, max_tokens)`).
//! - [`OpenAiChatClient`]: OpenAI-compatible implementation, single-shot.
//! - [`prompt`]: the versioned system instruction and few-shot table.
//! - [`Selector`] / [`SelectorConfig`]: sampling knobs and output interpretation.
//! - [`SelectionOutcome`]: `Chosen(text)` or `NoMatch`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use index::Candidate;
//! use selector::{ChatConfig, OpenAiChatClient, Selector, SelectorConfig, SelectionOutcome};
//!
//! # async fn run() -> Result<(), selector::SelectorError> {
//! let client = OpenAiChatClient::new(ChatConfig::default().with_api_key("sk-..."))?;
//! let selector = Selector::new(Arc::new(client), SelectorConfig::default());
//!
//! let candidates = vec![Candidate::new("Long story short, I survived", 0.82)];
//! match selector.select("Will this feeling ever pass?", &candidates).await? {
//!     SelectionOutcome::Chosen(lyric) => println!("{lyric}"),
//!     SelectionOutcome::NoMatch => println!("{}", selector::FallbackPicker::new().pick()),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod fallback;
pub mod prompt;
mod types;

pub use client::{ChatConfig, ChatModel, OpenAiChatClient, CHAT_MODEL};
pub use engine::{Selector, SelectorConfig};
pub use error::SelectorError;
pub use fallback::{FallbackPicker, FALLBACK_MESSAGES};
pub use prompt::{build_messages, NO_MATCH_SENTINEL, PROMPT_VERSION};
pub use types::{ChatMessage, Role, SelectionOutcome};
