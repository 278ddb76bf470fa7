// tracehub-api/src/ratelimit/tests.rs
// ============================================================================
// Module: Rate Limiter Unit Tests
// Description: Tests for bucket exhaustion and refill behavior.
// Purpose: Pin 429 semantics and per-key isolation.
// Dependencies: tracehub-api
// ============================================================================

//! ## Overview
//! Exhausts a bucket, verifies the retry hint, and checks that keys do not
//! interfere.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracehub_core::Timestamp;

use super::RateDecision;
use super::RateLimiter;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed base instant.
const T0: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn bucket_exhausts_then_limits() {
    let limiter = RateLimiter::new(3, 60);
    for _ in 0..3 {
        assert_eq!(limiter.check("ip|user", T0), RateDecision::Allowed);
    }
    let decision = limiter.check("ip|user", T0);
    assert!(matches!(decision, RateDecision::Limited { retry_after_secs } if retry_after_secs >= 1));
}

#[test]
fn bucket_refills_over_time() {
    let limiter = RateLimiter::new(1, 60);
    assert_eq!(limiter.check("ip|user", T0), RateDecision::Allowed);
    assert!(matches!(limiter.check("ip|user", T0), RateDecision::Limited { .. }));
    // One request per second refill: a second later the bucket admits again.
    assert_eq!(limiter.check("ip|user", T0.plus_millis(1_000)), RateDecision::Allowed);
}

#[test]
fn keys_are_isolated() {
    let limiter = RateLimiter::new(1, 60);
    assert_eq!(limiter.check("a|one", T0), RateDecision::Allowed);
    assert_eq!(limiter.check("b|two", T0), RateDecision::Allowed);
}
