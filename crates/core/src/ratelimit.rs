//! Fixed-window rate limiting for mutating operations.
//!
//! Process-lifetime counters per principal; nothing is persisted across
//! restarts. The limiter is an injectable collaborator: constructed once at
//! startup (window and max from configuration), held in shared state, and
//! consulted by handlers before any mutation. A multi-instance deployment
//! would need to back this with a shared counter store instead.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::DbId;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default maximum operations per principal per window.
pub const DEFAULT_MAX_OPS: u32 = 5;

struct Window {
    count: u32,
    started: Instant,
}

/// Per-principal fixed-window counter.
pub struct RateLimiter {
    max_ops: u32,
    window: Duration,
    counters: Mutex<HashMap<DbId, Window>>,
}

impl RateLimiter {
    pub fn new(max_ops: u32, window: Duration) -> Self {
        Self {
            max_ops,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Record one operation for `principal` and report whether it is allowed.
    ///
    /// A denied call does not consume quota; the caller is expected to reject
    /// the request without mutating anything.
    pub fn allow(&self, principal: DbId) -> bool {
        let now = Instant::now();
        let mut counters = self.counters.lock().expect("rate limiter mutex poisoned");

        let window = counters.entry(principal).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) > self.window {
            window.count = 1;
            window.started = now;
            return true;
        }

        if window.count >= self.max_ops {
            return false;
        }

        window.count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OPS, DEFAULT_WINDOW)
    }
}
