//! In-memory fixed-window rate limiter keyed by caller.
//!
//! Each key owns a counter and a reset time. A key's first request, or its
//! first request after the reset time has passed, opens a new window with a
//! count of 1. Within a window, requests are admitted until the count reaches
//! the ceiling; rejected requests do not move the counter.
//!
//! Keys are never evicted. Memory grows with the number of distinct callers
//! seen since startup.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{clock::Clock, config::RateLimitConfig};

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Count in the current window, including this request if allowed
    pub current: u32,
    /// The limit
    pub limit: u32,
    /// Seconds until the window resets, rounded up
    pub reset_secs: u64,
}

impl RateLimitResult {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.current)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at_ms: i64,
}

pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window_ms: i64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window_ms,
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.max_requests, config.window_ms(), clock)
    }

    /// Check and record one request from `key` at the clock's current time.
    pub fn admit(&self, key: &str) -> RateLimitResult {
        self.admit_at(key, self.clock.now_millis())
    }

    /// Check and record one request from `key` at `now_ms`.
    ///
    /// The map entry stays locked for the whole read-modify-write, so
    /// concurrent requests from one key never lose an update.
    pub fn admit_at(&self, key: &str, now_ms: i64) -> RateLimitResult {
        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at_ms: now_ms.saturating_add(self.window_ms),
        });

        if now_ms > window.reset_at_ms {
            window.count = 0;
            window.reset_at_ms = now_ms.saturating_add(self.window_ms);
        }

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        RateLimitResult {
            allowed,
            current: window.count,
            limit: self.max_requests,
            reset_secs: reset_secs(window.reset_at_ms, now_ms),
        }
    }

    /// Number of caller keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

fn reset_secs(reset_at_ms: i64, now_ms: i64) -> u64 {
    let remaining_ms = reset_at_ms.saturating_sub(now_ms).max(0) as u64;
    remaining_ms.div_ceil(1000)
}
