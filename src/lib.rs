pub mod client_key;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod server;
pub mod state;

pub use client_key::{ClientKey, RequestMetadata, resolve};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, GatewayError};
pub use rate_limit::{LimiterConfig, SlidingWindowLimiter, Verdict};
