//! Workspace umbrella crate for What Would Taylor Say (WWTS).
//!
//! This crate stitches the stage crates into one request pipeline:
//! rate limiting (`ratelimit`), question screening (`canonical`), embedding
//! (`semantic`), candidate retrieval (`index`) and lyric selection
//! (`selector`). Callers hand [`Pipeline::ask`] a client identity and the
//! raw request body and get back either an [`Answer`] or a single
//! [`PipelineError`].
//!
//! ```no_run
//! use wwts::{ClientIdentity, Pipeline, PipelineHandles};
//! # fn handles() -> PipelineHandles { unimplemented!() }
//!
//! # async fn run() {
//! let pipeline = Pipeline::new(handles());
//! let who = ClientIdentity::from_forwarded_for(Some("203.0.113.9"));
//! match pipeline.ask(&who, br#"{"question":"Will this feeling ever pass?"}"#).await {
//!     Ok(answer) => println!("{}", answer.lyric),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # }
//! ```

mod error;
mod identity;
mod lazy;
mod metrics;
mod pipeline;

pub use crate::error::{Dependency, PipelineError};
pub use crate::identity::ClientIdentity;
pub use crate::lazy::LazyHandle;
pub use crate::metrics::{set_pipeline_metrics, PipelineMetrics};
pub use crate::pipeline::{
    Answer, AskRequest, LyricSource, Pipeline, PipelineHandles, SharedPipeline, Stage,
};

pub use canonical::{sanitize_question, ValidationResult, GENERIC_ERROR, MAX_QUESTION_CHARS};

pub use canonical;
pub use index;
pub use ratelimit;
pub use selector;
pub use semantic;
