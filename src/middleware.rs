//! Admission control in front of the API routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client_key::{RequestMetadata, resolve};
use crate::error::GatewayError;
use crate::metrics::{RATE_LIMIT_ADMITTED, RATE_LIMIT_REJECTED};
use crate::rate_limit::SlidingWindowLimiter;

/// Resolve the caller, ask the limiter, and short-circuit with 429 when the
/// caller is over its budget.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<SlidingWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = resolve(&RequestMetadata::from_request(&request));
    let verdict = limiter.check_now(&client);
    let limit = limiter.config().max_requests;

    if verdict.is_rate_exceeded() {
        RATE_LIMIT_REJECTED.inc();
        warn!(
            client = %client,
            path = %request.uri().path(),
            count = verdict.current_count,
            limit,
            "rate limit exceeded"
        );
        return GatewayError::RateExceeded {
            client,
            count: verdict.current_count,
            limit,
        }
        .into_response();
    }

    RATE_LIMIT_ADMITTED.inc();
    debug!(client = %client, count = verdict.current_count, limit, "request admitted");

    next.run(request).await
}
