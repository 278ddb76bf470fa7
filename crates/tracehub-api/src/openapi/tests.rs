// tracehub-api/src/openapi/tests.rs
// ============================================================================
// Module: OpenAPI Unit Tests
// Description: Tests for document determinism and endpoint coverage.
// Purpose: Prevent silent drift between the contract and the router groups.
// Dependencies: tracehub-api
// ============================================================================

//! ## Overview
//! The document must be deterministic and must cover every contract group.

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

use super::documented_routes;
use super::openapi_document;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn document_is_deterministic() {
    assert_eq!(openapi_document(), openapi_document());
}

#[test]
fn every_contract_group_is_documented() {
    let routes = documented_routes();
    for group in [
        "/auth/",
        "/organizations",
        "/invitations",
        "/shipments",
        "/documents",
        "/tracking/",
        "/compliance/",
        "/audit-packs/",
        "/notifications",
    ] {
        assert!(
            routes.iter().any(|(_, path)| path.starts_with(group)),
            "missing contract group: {group}"
        );
    }
}

#[test]
fn all_operations_require_bearer_auth() {
    let document = openapi_document();
    let paths = document["paths"].as_object().unwrap();
    for (path, operations) in paths {
        for (method, operation) in operations.as_object().unwrap() {
            assert!(
                operation["security"].is_array(),
                "{method} {path} must declare bearer security"
            );
        }
    }
}
