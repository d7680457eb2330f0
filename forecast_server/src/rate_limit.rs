//! Per-client request limiting
//!
//! Limiters are injected into the application state rather than kept in a
//! process-wide map, so each server instance (and each test) owns its own.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Clients tracked before idle, fully refilled buckets are dropped
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Decides whether a client may make another request
pub trait RateLimiter: Send + Sync {
    /// Consume one request for `client`; `false` when it must be rejected
    fn try_acquire(&self, client: &str) -> bool;
}

/// Limiter that admits everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn try_acquire(&self, _client: &str) -> bool {
        true
    }
}

/// Token bucket state
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,
    /// Last refill instant
    last_refill: Instant,
}

/// Token buckets keyed by client identity
#[derive(Debug)]
pub struct TokenBucketLimiter {
    /// Maximum burst size
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl TokenBucketLimiter {
    /// Allow bursts of `capacity` refilled at `refill_rate` tokens per second
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity: capacity as f64,
            refill_rate,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Allow `requests` per minute with a burst of the same size
    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, requests as f64 / 60.0)
    }

    fn try_acquire_at(&self, client: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(client) {
            let (capacity, rate) = (self.capacity, self.refill_rate);
            buckets.retain(|_, b| {
                let elapsed = now.saturating_duration_since(b.last_refill).as_secs_f64();
                b.tokens + elapsed * rate < capacity
            });
        }

        let bucket = buckets.entry(client.to_string()).or_insert(TokenBucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn try_acquire(&self, client: &str) -> bool {
        self.try_acquire_at(client, Instant::now())
    }
}
