// tracehub-auditpack/src/indexpdf/tests.rs
// ============================================================================
// Module: Index PDF Unit Tests
// Description: Tests for deterministic PDF rendering.
// Purpose: Pin byte determinism, structure markers, and escaping.
// Dependencies: tracehub-auditpack
// ============================================================================

//! ## Overview
//! The writer must emit byte-identical documents for identical lines, valid
//! PDF structure markers, and escaped literals.

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

use super::escape_pdf_text;
use super::render_pdf;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn rendering_is_byte_deterministic() {
    let lines = vec![
        "TRACEHUB SHIPMENT AUDIT PACK".to_string(),
        "Reference: VIBO-2026-001".to_string(),
    ];
    assert_eq!(render_pdf(&lines), render_pdf(&lines));
}

#[test]
fn output_carries_pdf_markers() {
    let bytes = render_pdf(&["one line".to_string()]);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("%PDF-1.4"));
    assert!(text.contains("/Type /Catalog"));
    assert!(text.contains("/BaseFont /Helvetica"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn long_documents_paginate() {
    let lines: Vec<String> = (0..120).map(|index| format!("line {index}")).collect();
    let bytes = render_pdf(&lines);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 3"));
}

#[test]
fn parentheses_and_backslashes_are_escaped() {
    assert_eq!(escape_pdf_text("Apapa (NGAPP)"), "Apapa \\(NGAPP\\)");
    assert_eq!(escape_pdf_text("a\\b"), "a\\\\b");
    assert_eq!(escape_pdf_text("snow\u{2603}man"), "snow?man");
}

#[test]
fn empty_input_still_produces_one_page() {
    let bytes = render_pdf(&[]);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 1"));
}
