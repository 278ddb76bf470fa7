// tracehub-providers/src/classifier/tests.rs
// ============================================================================
// Module: Classifier Unit Tests
// Description: Tests for the keyword fallback classifier.
// Purpose: Pin keyword-to-type mapping and rejection on unknown content.
// Dependencies: tracehub-providers
// ============================================================================

//! ## Overview
//! Exercises the keyword table ordering and the fail-closed rejection path.

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

use tracehub_core::DetectionMethod;
use tracehub_core::DocumentType;
use tracehub_core::interfaces::ClassifierError;
use tracehub_core::interfaces::DocumentClassifier;

use super::KeywordClassifier;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn bill_of_lading_marker_wins() {
    let result = KeywordClassifier
        .classify(b"ORIGINAL - Bill of Lading\nShipper: VIBOTAJ Global", "text/plain")
        .unwrap();
    assert_eq!(result.document_type, DocumentType::BillOfLading);
    assert_eq!(result.detection_method, DetectionMethod::Keyword);
    assert!(result.confidence < 0.6);
}

#[test]
fn traces_marker_maps_to_eu_traces() {
    let result = KeywordClassifier.classify(b"EU TRACES certificate NL-2026", "text/plain").unwrap();
    assert_eq!(result.document_type, DocumentType::EuTraces);
}

#[test]
fn matching_is_case_insensitive() {
    let result =
        KeywordClassifier.classify(b"commercial invoice no. INV-44", "text/plain").unwrap();
    assert_eq!(result.document_type, DocumentType::CommercialInvoice);
}

#[test]
fn unknown_content_is_rejected() {
    let err = KeywordClassifier.classify(b"weekly newsletter", "text/plain").unwrap_err();
    assert!(matches!(err, ClassifierError::Rejected(_)));
}
