// tracehub-api/src/ratelimit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Token-bucket rate limiting per caller key.
// Purpose: Surface 429 with Retry-After before handlers run.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! A bounded map of token buckets keyed by `ip|subject`. Buckets refill
//! continuously from explicit timestamps so the limiter stays deterministic
//! under test clocks. When the map is full, the oldest-seen bucket is
//! evicted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use tracehub_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum tracked caller keys.
const MAX_TRACKED_KEYS: usize = 16_384;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Rate limit decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted.
    Allowed,
    /// Request rejected; retry after the given number of seconds.
    Limited {
        /// Seconds the caller should wait.
        retry_after_secs: u64,
    },
}

// ============================================================================
// SECTION: Bucket
// ============================================================================

/// One caller's bucket.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    /// Remaining tokens (scaled by 1000 for fractional refill).
    tokens_milli: u64,
    /// Last refill instant.
    refilled_at: Timestamp,
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Token-bucket rate limiter.
///
/// # Invariants
/// - Capacity and refill rate are fixed at construction.
pub struct RateLimiter {
    /// Bucket capacity in requests.
    capacity: u64,
    /// Refill rate in requests per minute.
    per_minute: u64,
    /// Buckets per caller key.
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Builds a limiter with the given capacity and refill rate.
    #[must_use]
    pub fn new(capacity: u64, per_minute: u64) -> Self {
        Self {
            capacity,
            per_minute,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admits or rejects one request for the caller key.
    pub fn check(&self, key: &str, now: Timestamp) -> RateDecision {
        let Ok(mut buckets) = self.buckets.lock() else {
            return RateDecision::Allowed;
        };
        if buckets.len() >= MAX_TRACKED_KEYS && !buckets.contains_key(key) {
            let oldest = buckets
                .iter()
                .min_by_key(|(_, bucket)| bucket.refilled_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                buckets.remove(&oldest);
            }
        }
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens_milli: self.capacity * 1_000,
            refilled_at: now,
        });

        // Continuous refill from the elapsed wall time.
        let elapsed_ms = bucket.refilled_at.abs_diff_millis(now);
        let refill_milli = elapsed_ms.saturating_mul(self.per_minute) / 60;
        bucket.tokens_milli =
            (bucket.tokens_milli.saturating_add(refill_milli)).min(self.capacity * 1_000);
        bucket.refilled_at = now;

        if bucket.tokens_milli >= 1_000 {
            bucket.tokens_milli -= 1_000;
            RateDecision::Allowed
        } else {
            let deficit_milli = 1_000 - bucket.tokens_milli;
            let wait_ms = deficit_milli.saturating_mul(60).div_ceil(self.per_minute.max(1));
            RateDecision::Limited {
                retry_after_secs: wait_ms.div_ceil(1_000).max(1),
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
