// tracehub-tracking/src/backoff/tests.rs
// ============================================================================
// Module: Backoff Unit Tests
// Description: Tests for the exponential schedule and its cap.
// Purpose: Pin the 5s base, 30m cap, and jitter bounds.
// Dependencies: tracehub-tracking
// ============================================================================

//! ## Overview
//! Verifies the deterministic delay curve and that jitter stays within its
//! ±20% envelope and under the cap.

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

use std::time::Duration;

use super::BackoffSchedule;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn delay_doubles_from_the_base() {
    let schedule = BackoffSchedule::from_millis(5_000, 1_800_000, 5);
    assert_eq!(schedule.delay_for(0), Duration::from_secs(5));
    assert_eq!(schedule.delay_for(1), Duration::from_secs(10));
    assert_eq!(schedule.delay_for(2), Duration::from_secs(20));
    assert_eq!(schedule.delay_for(3), Duration::from_secs(40));
}

#[test]
fn delay_is_capped_at_thirty_minutes() {
    let schedule = BackoffSchedule::from_millis(5_000, 1_800_000, 5);
    assert_eq!(schedule.delay_for(20), Duration::from_secs(1_800));
    assert_eq!(schedule.delay_for(63), Duration::from_secs(1_800));
}

#[test]
fn jitter_stays_inside_the_envelope() {
    let schedule = BackoffSchedule::from_millis(5_000, 1_800_000, 5);
    for _ in 0..64 {
        let jittered = schedule.jittered_delay_for(2);
        assert!(jittered >= Duration::from_secs(16), "below envelope: {jittered:?}");
        assert!(jittered <= Duration::from_secs(24), "above envelope: {jittered:?}");
    }
}

#[test]
fn jitter_never_exceeds_the_cap() {
    let schedule = BackoffSchedule::from_millis(5_000, 20_000, 5);
    for _ in 0..64 {
        assert!(schedule.jittered_delay_for(10) <= Duration::from_secs(20));
    }
}
