use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use std::fmt;
use std::net::SocketAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

// Shared bucket for requests we cannot attribute to anyone
pub const UNKNOWN_CLIENT: &str = "unknown";

// Identity that rate limiting is partitioned by (usually an IP string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// What we know about the caller, taken off the request
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub forwarded_for: Option<String>,
    pub peer: Option<SocketAddr>,
}

impl RequestMetadata {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded_for = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Self { forwarded_for, peer }
    }

    // Peer address only shows up when the server runs with connect info
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self::from_parts(req.headers(), peer)
    }
}

/// Work out who is calling.
///
/// The first `X-Forwarded-For` hop is trusted as the origin client, then the
/// transport peer IP, then the shared `"unknown"` bucket. Never fails.
pub fn resolve(meta: &RequestMetadata) -> ClientKey {
    let forwarded = meta
        .forwarded_for
        .as_deref()
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    if let Some(first) = forwarded {
        return ClientKey::new(first);
    }

    match meta.peer {
        Some(addr) => ClientKey::new(addr.ip().to_string()),
        None => ClientKey::unknown(),
    }
}
