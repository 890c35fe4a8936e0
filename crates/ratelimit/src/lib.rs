//! # WWTS rate limiting (`ratelimit`)
//!
//! Two named sliding windows per client identity, checked in a fixed order
//! against a shared [`CounterStore`]:
//!
//! - `hourly`: 5 requests per trailing hour
//! - `daily`: 75 requests per trailing 24 hours
//!
//! The hourly window is consulted first. A request it denies never reaches
//! the daily window, so blocked traffic does not burn daily budget.
//!
//! Every check is an atomic check-and-increment inside the store. Store
//! failures are returned as errors and never converted into an "allowed"
//! verdict: the limiter fails closed.
//!
//! ## Stores
//!
//! - [`MemoryStore`]: process-local, for development and tests.
//! - [`RedisRestStore`]: Redis over the Upstash-compatible REST API, with the
//!   sliding log kept in a sorted set and updated by a single Lua script.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ratelimit::{MemoryStore, RateLimiter, RateLimiterConfig, Verdict};
//!
//! # async fn demo() -> Result<(), ratelimit::RateLimitError> {
//! let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), RateLimiterConfig::default());
//! match limiter.check("203.0.113.7", ratelimit::now_ms()).await? {
//!     Verdict::Allowed => println!("go ahead"),
//!     Verdict::Limited { retry_after_secs, .. } => println!("wait {retry_after_secs}s"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod limiter;
mod memory;
mod redis;
mod store;

pub use crate::config::{RateLimiterConfig, WindowConfig, DEFAULT_KEY_PREFIX};
pub use crate::error::RateLimitError;
pub use crate::limiter::{now_ms, retry_after_secs, RateLimiter, Verdict};
pub use crate::memory::MemoryStore;
pub use crate::redis::{RedisRestConfig, RedisRestStore, SLIDING_LOG_SCRIPT};
pub use crate::store::{CounterStore, RateLimitDecision};
