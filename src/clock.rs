use std::sync::Mutex;
use std::time::{Duration, Instant};

// Source of "now" for the rate limiter.
// Returning None means the clock could not be read; callers fail open.
pub trait Clock: Send + Sync {
    fn now(&self) -> Option<Instant>;
}

// Monotonic process clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Option<Instant> {
        Some(Instant::now())
    }
}

/// Hand-driven clock for deterministic window tests.
///
/// Starts at the instant it was created and only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    offset: Duration,
    available: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                offset: Duration::ZERO,
                available: true,
            }),
        }
    }

    // Instant at `offset` past the origin, handy for passing to `check` directly
    pub fn at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.offset += by;
        }
    }

    pub fn set(&self, offset: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.offset = offset;
        }
    }

    // Simulate a clock that cannot be read
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.available = available;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Option<Instant> {
        let state = self.state.lock().ok()?;
        state.available.then(|| self.origin + state.offset)
    }
}
