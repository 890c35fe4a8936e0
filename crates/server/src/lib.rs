//! HTTP surface for the What Would Taylor Say lyric service.
//!
//! One question endpoint plus operational probes:
//!
//! - `POST /api/ask` - `{"question": "..."}` in, `{"lyric": "..."}` out
//! - `GET /health` - liveness
//! - `GET /ready` - which credentials are configured (booleans only)
//! - `GET /metrics` - Prometheus exposition when enabled
//!
//! Every error body is `{"error": "..."}` with a fixed message; 429s also
//! carry `retryAfter` and a `Retry-After` header.
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ServerResult};
pub use server::{build_router, start_server};
pub use state::AppState;
