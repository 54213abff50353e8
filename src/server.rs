//! Router wiring and process startup.
//!
//! | Method | Path | Rate limited |
//! |--------|------|--------------|
//! | `POST` | `/api/generate` | yes |
//! | `GET`  | `/health` | no |
//! | `GET`  | `/metrics` | no |

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::Args;
use crate::handlers::{generate_handler, health_handler, metrics_handler};
use crate::middleware::enforce_rate_limit;
use crate::rate_limit::{SlidingWindowLimiter, sweeper};
use crate::state::AppState;

pub fn build_app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/generate", post(generate_handler))
        .layer(from_fn_with_state(state.limiter.clone(), enforce_rate_limit));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(api)
        .with_state(state)
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.limiter_config().context("invalid rate limit settings")?;
    let limiter = Arc::new(SlidingWindowLimiter::new(config.clone())?);
    let state = Arc::new(
        AppState::new(&args.upstream_url, args.upstream_timeout(), limiter.clone())
            .context("build http client")?,
    );

    // spawn the background sweeper
    tokio::spawn(sweeper(limiter, args.sweep_every()));

    let app = build_app(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {}", addr))?;

    info!(%addr, upstream = %state.upstream_url, "gateway listening");
    info!(
        limit = config.max_requests,
        window_secs = config.window.as_secs(),
        idle_ttl_secs = config.idle_ttl.as_secs(),
        max_tracked = config.max_tracked_keys,
        "rate limit configured"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")
}
