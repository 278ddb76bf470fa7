// tracehub-core/src/runtime/document_flow/tests.rs
// ============================================================================
// Module: Document Lifecycle Unit Tests
// Description: Tests for the document transition table and executor.
// Purpose: Ensure only legal transitions succeed and expiry edges behave.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises the document lifecycle table: the happy upload path, illegal
//! pairs, and the time-driven expiry wildcard.

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

use super::DocumentEvent;
use super::DocumentFlow;
use super::DocumentFlowError;
use crate::core::document::DocumentStatus;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn upload_path_reaches_linked() {
    let mut status = DocumentStatus::Draft;
    for event in [
        DocumentEvent::FilePersisted,
        DocumentEvent::Approved,
        DocumentEvent::CompliancePassed,
        DocumentEvent::Linked,
    ] {
        status = DocumentFlow::apply(status, event).unwrap();
    }
    assert_eq!(status, DocumentStatus::Linked);
}

#[test]
fn draft_cannot_validate_directly() {
    let err = DocumentFlow::apply(DocumentStatus::Draft, DocumentEvent::Approved).unwrap_err();
    assert_eq!(
        err,
        DocumentFlowError::InvalidTransition {
            from: "draft",
            event: "approved",
        }
    );
}

#[test]
fn expiry_applies_from_any_non_terminal() {
    for status in [
        DocumentStatus::Draft,
        DocumentStatus::Uploaded,
        DocumentStatus::PendingValidation,
        DocumentStatus::Validated,
        DocumentStatus::ComplianceOk,
        DocumentStatus::ComplianceFailed,
        DocumentStatus::Linked,
    ] {
        assert_eq!(
            DocumentFlow::apply(status, DocumentEvent::Expired).unwrap(),
            DocumentStatus::Expired
        );
    }
}

#[test]
fn expiry_rejected_on_terminal_statuses() {
    for status in [DocumentStatus::Archived, DocumentStatus::Rejected, DocumentStatus::Expired] {
        assert!(DocumentFlow::apply(status, DocumentEvent::Expired).is_err());
    }
}

#[test]
fn table_matches_apply_for_every_row() {
    for (from, event, to) in DocumentFlow::transitions() {
        assert_eq!(DocumentFlow::apply(*from, *event).unwrap(), *to);
    }
}

#[test]
fn compliance_failed_documents_can_still_link_after_override() {
    let status =
        DocumentFlow::apply(DocumentStatus::ComplianceFailed, DocumentEvent::Linked).unwrap();
    assert_eq!(status, DocumentStatus::Linked);
}
