//! Per-client sliding-window rate limiting.
//!
//! Every client key owns a log of request instants. A check appends "now",
//! drops everything at or before `now - window`, and admits the request while
//! the log holds at most `max_requests` instants.
//!
//! Each log also has a deadline fixed when it is created, `idle_ttl` later.
//! The first check at or past the deadline starts a fresh log, even if the
//! client never went quiet. With the default `idle_ttl == window` an active
//! client can therefore land up to `2 * max_requests` requests around that
//! reset. Raise `idle_ttl` above the window to make the reset rarer.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, warn};

use crate::client_key::ClientKey;
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::metrics::{RATE_LIMIT_EVICTED, RATE_LIMIT_SWEPT, TRACKED_CLIENTS};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 100_000;

// A full table evicts this fraction of its capacity on top of what it needs,
// so a flood of new keys doesn't rescan the table on every request.
const EVICTION_BATCH_DIVISOR: usize = 16;

/// Limiter settings. Fixed once handed to [`SlidingWindowLimiter::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    pub window: Duration,
    pub max_requests: usize,
    /// How long an entry lives after it was created before it is reclaimed.
    pub idle_ttl: Duration,
    /// Ceiling on distinct client keys held at once.
    pub max_tracked_keys: usize,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
            idle_ttl: DEFAULT_WINDOW,
            max_tracked_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

impl LimiterConfig {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            idle_ttl: window,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.max_tracked_keys == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.idle_ttl < self.window {
            return Err(ConfigError::IdleTtlShorterThanWindow {
                ttl: self.idle_ttl,
                window: self.window,
            });
        }
        Ok(())
    }

    // Longest log we keep per client, however bursty it is
    fn max_log_len(&self) -> usize {
        self.max_requests.saturating_mul(2)
    }
}

/// Result of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub admitted: bool,
    pub current_count: usize,
}

impl Verdict {
    fn new(count: usize, limit: usize) -> Self {
        Self {
            admitted: count <= limit,
            current_count: count,
        }
    }

    // Used when we cannot make a decision at all
    fn fail_open() -> Self {
        Self {
            admitted: true,
            current_count: 0,
        }
    }

    pub fn is_rate_exceeded(&self) -> bool {
        !self.admitted
    }
}

// Per-client request log
#[derive(Debug)]
struct WindowEntry {
    timestamps: VecDeque<Instant>,
    created_at: Instant,
    // None when the ttl reaches past what Instant can represent
    expires_at: Option<Instant>,
}

impl WindowEntry {
    fn new(now: Instant, ttl: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            created_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    fn last_activity(&self) -> Instant {
        self.timestamps.back().copied().unwrap_or(self.created_at)
    }

    // Append, prune, bound. Returns the resulting log length.
    fn record(&mut self, now: Instant, window: Duration, max_len: usize) -> usize {
        // never insert behind the newest instant, the log stays sorted
        let now = self.timestamps.back().map_or(now, |&last| now.max(last));
        self.timestamps.push_back(now);

        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        while self.timestamps.len() > max_len {
            self.timestamps.pop_front();
        }

        self.timestamps.len()
    }

    fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.timestamps
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < window)
            .count()
    }
}

/// Sliding-window limiter keyed by [`ClientKey`].
///
/// Entries live in a sharded map, so checks for different clients only meet
/// when their keys share a shard, and every mutation of one client's log
/// happens under that shard's write lock.
pub struct SlidingWindowLimiter {
    config: LimiterConfig,
    entries: DashMap<ClientKey, WindowEntry>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(config: LimiterConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            entries: DashMap::new(),
            clock,
        })
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    /// Record a request from `key` arriving at `now` and decide on it.
    ///
    /// The request is logged even when rejected, so a client that keeps
    /// hammering stays over the limit.
    pub fn check(&self, key: &ClientKey, now: Instant) -> Verdict {
        if !self.entries.contains_key(key) && self.entries.len() >= self.config.max_tracked_keys {
            self.make_room(now);
        }

        let ttl = self.config.idle_ttl;
        let mut inserted = false;
        let mut entry = self.entries.entry(key.clone()).or_insert_with(|| {
            inserted = true;
            WindowEntry::new(now, ttl)
        });

        if entry.is_expired(now) {
            *entry = WindowEntry::new(now, ttl);
        }

        let count = entry.record(now, self.config.window, self.config.max_log_len());
        drop(entry);

        if inserted {
            TRACKED_CLIENTS.set(self.entries.len() as f64);
        }

        Verdict::new(count, self.config.max_requests)
    }

    /// Same as [`check`](Self::check) with the injected clock.
    /// An unreadable clock admits the request.
    pub fn check_now(&self, key: &ClientKey) -> Verdict {
        match self.clock.now() {
            Some(now) => self.check(key, now),
            None => {
                warn!(client = %key, "clock unavailable, admitting request unchecked");
                Verdict::fail_open()
            }
        }
    }

    // Requests from `key` still inside the window, without recording anything
    pub fn count_for(&self, key: &ClientKey, now: Instant) -> usize {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map_or(0, |entry| entry.count_within(now, self.config.window))
    }

    /// Drop every expired entry. Returns how many were removed.
    ///
    /// The expiry test runs under the shard lock, so an entry a concurrent
    /// check just refreshed is never removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });

        RATE_LIMIT_SWEPT.inc_by(removed as f64);
        TRACKED_CLIENTS.set(self.entries.len() as f64);
        removed
    }

    pub fn sweep_now(&self) -> usize {
        self.clock.now().map_or(0, |now| self.sweep(now))
    }

    // Table is full: reclaim expired entries, then the least recently active ones
    fn make_room(&self, now: Instant) {
        let swept = self.sweep(now);
        let cap = self.config.max_tracked_keys;
        let len = self.entries.len();
        if len < cap {
            debug!(swept, "made room by sweeping expired clients");
            return;
        }

        let batch = (len + 1 - cap + cap / EVICTION_BATCH_DIVISOR).min(len);
        let mut candidates: Vec<(Instant, ClientKey)> = self
            .entries
            .iter()
            .map(|item| (item.value().last_activity(), item.key().clone()))
            .collect();
        if batch < candidates.len() {
            candidates.select_nth_unstable(batch);
            candidates.truncate(batch);
        }

        let mut evicted = 0;
        for (seen, key) in candidates {
            // skip anyone who came back since we looked
            if self
                .entries
                .remove_if(&key, |_, entry| entry.last_activity() <= seen)
                .is_some()
            {
                evicted += 1;
            }
        }

        RATE_LIMIT_EVICTED.inc_by(evicted as f64);
        TRACKED_CLIENTS.set(self.entries.len() as f64);

        warn!(swept, evicted, capacity = cap, "client table full, evicted least recently active clients");
    }
}

// Background sweep - reclaims entries from clients that went quiet
pub async fn sweeper(limiter: Arc<SlidingWindowLimiter>, every: Duration) {
    let mut interval = interval(every);

    debug!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep_now();
        let tracked = limiter.tracked_keys();

        if removed > 0 {
            debug!(removed, tracked, "swept expired rate limit entries");
        }
    }
}
