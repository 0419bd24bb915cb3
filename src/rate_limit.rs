//! Per-client sliding-window request limiter.
//!
//! Window-reset semantics: the first request in a fresh window starts the
//! count at 1, requests inside the window increment it, and once the count
//! passes the limit every further request is denied until the window
//! expires. Counters live in process memory only; a restart forgets them.
//! This damps abuse, it is not an exact rate guarantee.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

pub struct RateLimiter {
    window: Duration,
    limit: u32,
    hits: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            window,
            limit,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` and return whether it is admitted.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().expect("rate limiter mutex poisoned");

        // Opportunistic pruning keeps the map from growing with dead keys.
        hits.retain(|_, w| now.duration_since(w.started) < self.window);

        match hits.get_mut(key) {
            Some(w) if now.duration_since(w.started) < self.window => {
                w.count += 1;
                w.count <= self.limit
            }
            _ => {
                hits.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        started: now,
                    },
                );
                true
            }
        }
    }
}
