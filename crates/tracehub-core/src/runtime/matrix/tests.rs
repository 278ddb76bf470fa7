// tracehub-core/src/runtime/matrix/tests.rs
// ============================================================================
// Module: Compliance Matrix Unit Tests
// Description: Tests for EUDR applicability and required document lookups.
// Purpose: Pin the canonical policy table and the horn/hoof exclusion.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Pins the built-in v1 matrix: EUDR prefixes, the horn/hoof exclusion, and
//! the required document sets per product type.

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

use super::ComplianceMatrix;
use super::eudr_applicable;
use super::is_horn_hoof;
use crate::core::document::DocumentType;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn eudr_prefixes_apply() {
    for hs in ["1801.00", "0901.21", "1511.10", "4001.22", "1201.90"] {
        assert!(eudr_applicable(hs), "{hs} should be EUDR-applicable");
    }
}

#[test]
fn non_eudr_products_do_not_apply() {
    for hs in ["0714.20", "0902.10", "0910.11"] {
        assert!(!eudr_applicable(hs), "{hs} should not be EUDR-applicable");
    }
}

#[test]
fn horn_hoof_is_excluded_even_from_extended_sets() {
    for hs in ["0506.90", "0507.10"] {
        assert!(is_horn_hoof(hs));
        assert!(!eudr_applicable(hs), "{hs} must never be EUDR-applicable");
    }
}

#[test]
fn horn_hoof_requires_traces_and_vet_cert() {
    let matrix = ComplianceMatrix::builtin();
    let required = matrix.required_documents("horn_hoof");
    assert!(required.contains(&DocumentType::EuTraces));
    assert!(required.contains(&DocumentType::VeterinaryHealth));
    assert!(!required.contains(&DocumentType::EudrDueDiligence));
}

#[test]
fn cocoa_requires_due_diligence() {
    let matrix = ComplianceMatrix::builtin();
    let required = matrix.required_documents("cocoa");
    assert!(required.contains(&DocumentType::EudrDueDiligence));
}

#[test]
fn hs_lookup_matches_prefix() {
    let matrix = ComplianceMatrix::builtin();
    let entry = matrix.entry_for_hs_code("1801.00").unwrap();
    assert_eq!(entry.product_type, "cocoa");
    assert!(entry.eudr_applicable);
}

#[test]
fn unknown_product_falls_back_to_baseline_set() {
    let matrix = ComplianceMatrix::builtin();
    let required = matrix.required_documents("timber");
    assert_eq!(
        required,
        vec![
            DocumentType::BillOfLading,
            DocumentType::CommercialInvoice,
            DocumentType::PackingList,
            DocumentType::CertificateOfOrigin,
        ]
    );
}

#[test]
fn vet_cert_expectation_names_nigerian_authorities() {
    let matrix = ComplianceMatrix::builtin();
    let entry = matrix.entry_for_product("horn_hoof").unwrap();
    let expectation = entry
        .validation_expectations
        .iter()
        .find(|e| e.document_type == DocumentType::VeterinaryHealth)
        .unwrap();
    assert!(!expectation.expected_issuing_authorities.is_empty());
}
