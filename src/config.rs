use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rate_limit::LimiterConfig;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-gateway")]
#[command(about = "Rate-limited HTTP front-end for LLM chat providers")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "GATEWAY_PORT", default_value_t = 8080)]
    pub port: u16,

    // Provider base url, requests go to {upstream_url}/api/generate
    #[arg(short, long, env = "GATEWAY_UPSTREAM_URL", default_value = "http://localhost:11434")]
    pub upstream_url: String,

    // Upstream request timeout in seconds
    #[arg(long, env = "GATEWAY_UPSTREAM_TIMEOUT", default_value_t = 120)]
    pub upstream_timeout: u64,

    // Rate limit max requests per window
    #[arg(long, env = "GATEWAY_RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, env = "GATEWAY_RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Seconds a client entry lives before it is reclaimed (defaults to the window)
    #[arg(long, env = "GATEWAY_IDLE_TTL")]
    pub idle_ttl: Option<u64>,

    // Ceiling on distinct clients tracked at once
    #[arg(long, env = "GATEWAY_MAX_TRACKED_CLIENTS", default_value_t = 100_000)]
    pub max_tracked_clients: usize,

    // Sweep interval in seconds (defaults to the window)
    #[arg(long, env = "GATEWAY_SWEEP_INTERVAL")]
    pub sweep_interval: Option<u64>,
}

impl Args {
    pub fn limiter_config(&self) -> Result<LimiterConfig, ConfigError> {
        let window = Duration::from_secs(self.rate_window);
        let config = LimiterConfig {
            window,
            max_requests: self.rate_limit,
            idle_ttl: self.idle_ttl.map_or(window, Duration::from_secs),
            max_tracked_keys: self.max_tracked_clients,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn sweep_every(&self) -> Duration {
        // tokio intervals panic on a zero period
        let secs = self.sweep_interval.unwrap_or(self.rate_window).max(1);
        Duration::from_secs(secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}
