// tracehub-tracking/src/backoff.rs
// ============================================================================
// Module: Retry Backoff
// Description: Exponential backoff schedule with jitter.
// Purpose: Pace transient-failure retries (base 5s, cap 30m).
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Transient upstream failures retry on an exponential schedule: the delay
//! for attempt `n` is `base * 2^n`, capped, with ±20% jitter so a fleet of
//! workers does not synchronize against a recovering provider.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use rand::Rng;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Jitter divisor applied to each delay (1/5 = ±20%).
const JITTER_DIVISOR: u64 = 5;

// ============================================================================
// SECTION: Backoff Schedule
// ============================================================================

/// Exponential backoff schedule.
///
/// # Invariants
/// - `base` is positive and no greater than `cap`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffSchedule {
    /// Base delay.
    base: Duration,
    /// Delay ceiling.
    cap: Duration,
    /// Maximum attempts before giving up.
    max_attempts: u32,
}

impl BackoffSchedule {
    /// Builds a schedule from milliseconds.
    #[must_use]
    pub const fn from_millis(base_ms: u64, cap_ms: u64, max_attempts: u32) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            cap: Duration::from_millis(cap_ms),
            max_attempts,
        }
    }

    /// Returns the maximum attempt count.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the deterministic (un-jittered) delay for an attempt.
    ///
    /// Attempt numbering starts at 0 for the first retry.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = u64::try_from(self.base.as_millis())
            .unwrap_or(u64::MAX)
            .saturating_mul(multiplier);
        Duration::from_millis(millis).min(self.cap)
    }

    /// Returns the jittered delay for an attempt.
    #[must_use]
    pub fn jittered_delay_for(&self, attempt: u32) -> Duration {
        let base = self.delay_for(attempt);
        let millis = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            return base;
        }
        let spread = millis / JITTER_DIVISOR;
        if spread == 0 {
            return base;
        }
        let mut rng = rand::thread_rng();
        let offset = rng.gen_range(0..=spread.saturating_mul(2));
        Duration::from_millis(millis.saturating_sub(spread).saturating_add(offset)).min(self.cap)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
