use std::sync::Arc;
use std::time::Duration;

use crate::rate_limit::SlidingWindowLimiter;

// app's shared state

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream_url: String, // provider base url
    pub limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    pub fn new(
        upstream_url: &str,
        timeout: Duration,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            upstream_url: normalize_url(upstream_url),
            limiter,
        })
    }
}

// "localhost:11434" -> "http://localhost:11434"
fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
