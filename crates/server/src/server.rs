//! Server initialization and routing

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, ask, health, method_not_allowed, not_found};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use ratelimit::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// How often idle in-memory counters are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Slack between the handler deadline and the outer backstop.
const BACKSTOP_SLACK: Duration = Duration::from_secs(5);

/// Build the Axum router with all routes and middleware
///
/// Middleware runs outermost first: trace, logging, request id, CORS,
/// timeout backstop, body limit.
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/api/ask", post(ask::ask).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            state.config.timeout() + BACKSTOP_SLACK,
        ))
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
///
/// Sets up JSON logging, installs the metrics recorder when enabled,
/// wires the pipeline and serves until SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let addr: SocketAddr = config.socket_addr()?;
    let readiness = config.readiness();
    let metrics_enabled = config.metrics_enabled;

    let mut state = AppState::from_config(config);
    if metrics_enabled {
        state = state.with_prometheus(crate::metrics::install()?);
    }
    if let Some(store) = state.memory_store.clone() {
        spawn_sweeper(store, state.config.limiter_config().daily);
    }

    tracing::info!(
        %addr,
        timeout_secs = state.config.timeout_secs,
        max_body_kb = state.config.max_body_size_kb,
        cors = state.config.enable_cors,
        metrics = metrics_enabled,
        "starting wwts server"
    );
    if !readiness.all() {
        tracing::warn!(
            openai = readiness.openai,
            rate_limit_store = readiness.rate_limit_store,
            vector_index = readiness.vector_index,
            "credentials missing; affected requests will fail"
        );
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Drops in-memory entries whose every timestamp has left the longest window.
fn spawn_sweeper(store: Arc<MemoryStore>, longest: ratelimit::WindowConfig) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let before = store.len();
            store.evict_idle(&longest, ratelimit::now_ms());
            let removed = before.saturating_sub(store.len());
            if removed > 0 {
                tracing::debug!(removed, remaining = store.len(), "swept idle rate limit keys");
            }
        }
    });
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
