use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of requests").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Upstream round-trip latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_ADMITTED: Counter =
        register_counter!("gateway_rate_limit_admitted_total", "Requests admitted by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_REJECTED: Counter =
        register_counter!("gateway_rate_limit_rejected_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_SWEPT: Counter =
        register_counter!("gateway_rate_limit_swept_total", "Expired client entries reclaimed by the sweeper").unwrap();
    pub static ref RATE_LIMIT_EVICTED: Counter =
        register_counter!("gateway_rate_limit_evicted_total", "Active client entries evicted because the table was full").unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("gateway_tracked_clients", "Client keys currently held by the rate limiter").unwrap();
}
