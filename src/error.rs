//! Error types for the gateway and its limiter configuration.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::client_key::ClientKey;

pub const RATE_LIMIT_BODY: &str = "Too many requests. Please try again later.";
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";

/// Rejected limiter settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate window must be longer than zero")]
    ZeroWindow,

    #[error("at least one request per window must be allowed")]
    ZeroLimit,

    #[error("max tracked clients must be at least one")]
    ZeroCapacity,

    #[error("idle entry ttl ({ttl:?}) must not be shorter than the rate window ({window:?})")]
    IdleTtlShorterThanWindow { ttl: Duration, window: Duration },
}

/// Errors surfaced on the HTTP path
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded for client {client} ({count}/{limit})")]
    RateExceeded {
        client: ClientKey,
        count: usize,
        limit: usize,
    },

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream returned an unreadable response: {0}")]
    InvalidUpstreamResponse(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::RateExceeded { limit, .. } => {
                let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_BODY).into_response();
                response
                    .headers_mut()
                    .insert(RATE_LIMIT_HEADER, HeaderValue::from(limit));
                response
            }
            GatewayError::Upstream(msg) | GatewayError::InvalidUpstreamResponse(msg) => (
                StatusCode::BAD_GATEWAY,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                msg,
            )
                .into_response(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
