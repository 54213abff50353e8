use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{GenerateRequest, GenerateResponse};
use crate::state::AppState;

// Forward chat text upstream and hand back the parsed reply.
// Admission control already ran in the middleware.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> GatewayResult<Json<GenerateResponse>> {
    REQUEST_TOTAL.inc();

    let start_time = Instant::now();
    let url = format!("{}/api/generate", state.upstream_url);

    // the reply is parsed as one JSON document, so ask for it unstreamed
    let upstream_req = GenerateRequest {
        stream: false,
        ..payload
    };

    let res = state
        .client
        .post(&url)
        .json(&upstream_req)
        .send()
        .await
        .map_err(|e| {
            warn!(upstream = %url, error = %e, "upstream request failed");
            GatewayError::Upstream(e.to_string())
        })?;

    let status = res.status();
    if !status.is_success() {
        warn!(upstream = %url, %status, "upstream returned an error status");
        return Err(GatewayError::Upstream(format!("upstream returned {}", status)));
    }

    let body = res
        .json::<GenerateResponse>()
        .await
        .map_err(|e| GatewayError::InvalidUpstreamResponse(e.to_string()))?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    info!(model = %body.model, elapsed_ms = start_time.elapsed().as_millis() as u64, "generated reply");

    Ok(Json(body))
}
