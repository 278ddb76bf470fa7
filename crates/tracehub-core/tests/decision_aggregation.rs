// tracehub-core/tests/decision_aggregation.rs
// ============================================================================
// Module: Decision Aggregation Tests
// Description: Property tests for decision aggregation and determinism.
// Purpose: Verify REJECT/HOLD/APPROVE semantics over arbitrary result sets.
// Dependencies: tracehub-core, proptest
// ============================================================================

//! ## Overview
//! Verifies the aggregation contract: REJECT iff an un-overridden ERROR
//! failure exists; HOLD iff no such failure exists but an un-overridden
//! WARNING failure does; APPROVE otherwise.

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

use proptest::prelude::Strategy;
use proptest::prelude::any;
use proptest::prop_compose;
use proptest::proptest;
use tracehub_core::Decision;
use tracehub_core::RuleResult;
use tracehub_core::Severity;
use tracehub_core::aggregate;

// ============================================================================
// SECTION: Strategies
// ============================================================================

/// Strategy over failure severities.
fn severity() -> impl Strategy<Value = Severity> {
    proptest::sample::select(vec![Severity::Info, Severity::Warning, Severity::Error])
}

prop_compose! {
    /// Strategy over arbitrary rule results.
    fn rule_result()(
        severity in severity(),
        passed in any::<bool>(),
        overridden in any::<bool>(),
        index in 0u32..999,
    ) -> RuleResult {
        RuleResult {
            rule_id: format!("GEN-{index:03}"),
            rule_name: "generated".to_string(),
            severity,
            passed,
            message: "generated result".to_string(),
            field: None,
            expected: None,
            actual: None,
            overridden,
        }
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn aggregation_follows_severity_precedence(results in proptest::collection::vec(rule_result(), 0..24)) {
        let decision = aggregate(&results);
        let has_error = results.iter().any(|r| !r.passed && !r.overridden && r.severity == Severity::Error);
        let has_warning = results.iter().any(|r| !r.passed && !r.overridden && r.severity == Severity::Warning);
        let expected = if has_error {
            Decision::Reject
        } else if has_warning {
            Decision::Hold
        } else {
            Decision::Approve
        };
        proptest::prop_assert_eq!(decision, expected);
    }

    #[test]
    fn aggregation_is_deterministic(results in proptest::collection::vec(rule_result(), 0..24)) {
        proptest::prop_assert_eq!(aggregate(&results), aggregate(&results));
    }

    #[test]
    fn overridden_failures_never_block(mut results in proptest::collection::vec(rule_result(), 0..24)) {
        for result in &mut results {
            result.overridden = true;
        }
        proptest::prop_assert_eq!(aggregate(&results), Decision::Approve);
    }

    #[test]
    fn passed_results_never_block(mut results in proptest::collection::vec(rule_result(), 0..24)) {
        for result in &mut results {
            result.passed = true;
        }
        proptest::prop_assert_eq!(aggregate(&results), Decision::Approve);
    }
}
