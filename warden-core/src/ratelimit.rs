//! Token-bucket rate limiting
//!
//! A single table keyed by caller-composed strings (typically
//! `action:identity`) admits or rejects actions. Buckets are created
//! lazily, refill proportionally to elapsed time, and are swept once
//! they have been idle for a day.
//!
//! The table is owned by whoever constructs the [`RateLimiter`] and is
//! shared by reference into request handlers, so there is no ambient
//! global state to reason about.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::interval;
use tracing::debug;

use crate::error::RateLimitError;

/// How often the background sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Buckets idle longer than this are removed by the sweep
pub const IDLE_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// A named admission budget: at most `max_tokens` actions per `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_tokens: u32,
    pub window: Duration,
}

/// Login and signup attempts, per identity
pub const AUTH_QUOTA: Quota = Quota {
    max_tokens: 5,
    window: Duration::from_secs(60),
};

/// New posts, per identity
pub const POSTING_QUOTA: Quota = Quota {
    max_tokens: 10,
    window: Duration::from_secs(60),
};

/// Comments, per identity
pub const COMMENTING_QUOTA: Quota = Quota {
    max_tokens: 20,
    window: Duration::from_secs(60),
};

/// Link-preview fetches, per identity
pub const PREVIEW_QUOTA: Quota = Quota {
    max_tokens: 3,
    window: Duration::from_secs(60),
};

/// One bucket in the table
///
/// Invariant: `tokens <= max_tokens`, and `last_refill` never moves
/// backwards.
struct Bucket {
    tokens: u32,
    max_tokens: u32,
    window: Duration,
    last_refill: Instant,
}

impl Bucket {
    /// Refill proportionally to elapsed time, then try to consume one
    /// token. `last_refill` advances only when at least one whole token
    /// was added, so sub-granular elapses are not lost to rounding.
    fn try_consume(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let added = (elapsed.as_nanos() * self.max_tokens as u128
            / self.window.as_nanos().max(1))
        .min(self.max_tokens as u128) as u32;

        if added > 0 {
            self.tokens = (self.tokens + added).min(self.max_tokens);
            self.last_refill = now;
        }

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Shared admission table for the whole process
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one action for `key`.
    ///
    /// The first sighting of a key creates its bucket with
    /// `max_tokens - 1` tokens: the triggering call consumes one. A
    /// bucket keeps the parameters it was created with; later calls
    /// with different values do not resize it.
    ///
    /// Returns `true` when admitted. A rejection is terminal for this
    /// attempt; there are no internal retries.
    pub fn check_and_consume(&self, key: &str, max_tokens: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();

        match buckets.get_mut(key) {
            Some(bucket) => bucket.try_consume(now),
            None => {
                buckets.insert(
                    key.to_string(),
                    Bucket {
                        tokens: max_tokens.saturating_sub(1),
                        max_tokens,
                        window,
                        last_refill: now,
                    },
                );
                true
            }
        }
    }

    /// [`check_and_consume`](Self::check_and_consume) against a preset
    /// quota, reporting rejection as a structured error.
    pub fn check(&self, key: &str, quota: Quota) -> Result<(), RateLimitError> {
        if self.check_and_consume(key, quota.max_tokens, quota.window) {
            Ok(())
        } else {
            Err(RateLimitError::Exceeded {
                key: key.to_string(),
            })
        }
    }

    /// Remove buckets idle longer than `max_idle`. Returns how many
    /// were removed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let before = buckets.len();
        buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) <= max_idle);
        before - buckets.len()
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the hourly sweep for a shared limiter.
///
/// The sweep holds the same lock as admission checks, but only for the
/// retain pass, so foreground calls are delayed by at most one lock
/// acquisition.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(SWEEP_INTERVAL);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_idle(IDLE_EXPIRY);
            if removed > 0 {
                debug!(removed, remaining = limiter.len(), "swept idle rate-limit buckets");
            }
        }
    })
}
