// tracehub-core/src/runtime/shipment_flow/tests.rs
// ============================================================================
// Module: Shipment Lifecycle Unit Tests
// Description: Tests for shipment transitions and regression guards.
// Purpose: Ensure carrier events and document completeness derive status.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises the shipment lifecycle: the document-driven path, the carrier
//! event path, the customs release sequence, and the no-regression guard.

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

use super::ShipmentEvent;
use super::ShipmentFlow;
use crate::core::shipment::ShipmentStatus;
use crate::core::tracking::EventStatus;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn document_path_reaches_docs_complete() {
    let status =
        ShipmentFlow::apply(ShipmentStatus::Draft, ShipmentEvent::DocumentUploaded).unwrap();
    assert_eq!(status, ShipmentStatus::DocsPending);
    let status = ShipmentFlow::apply(status, ShipmentEvent::RequiredDocsComplete).unwrap();
    assert_eq!(status, ShipmentStatus::DocsComplete);
}

#[test]
fn departure_moves_docs_complete_to_in_transit() {
    let next = ShipmentFlow::advance_on_carrier(
        ShipmentStatus::DocsComplete,
        EventStatus::Departed,
        false,
    );
    assert_eq!(next, Some(ShipmentStatus::InTransit));
}

#[test]
fn arrival_skips_customs_without_hold() {
    let next =
        ShipmentFlow::advance_on_carrier(ShipmentStatus::InTransit, EventStatus::Arrived, false);
    assert_eq!(next, Some(ShipmentStatus::Arrived));
    let next =
        ShipmentFlow::advance_on_carrier(ShipmentStatus::Arrived, EventStatus::Delivered, false);
    assert_eq!(next, Some(ShipmentStatus::Delivered));
}

#[test]
fn customs_hold_then_release_and_gate_out_delivers() {
    let next =
        ShipmentFlow::advance_on_carrier(ShipmentStatus::Arrived, EventStatus::CustomsHold, false);
    assert_eq!(next, Some(ShipmentStatus::Customs));
    // Gate-out alone is not delivery while the hold stands.
    let next =
        ShipmentFlow::advance_on_carrier(ShipmentStatus::Customs, EventStatus::GateOut, false);
    assert_eq!(next, None);
    let next =
        ShipmentFlow::advance_on_carrier(ShipmentStatus::Customs, EventStatus::GateOut, true);
    assert_eq!(next, Some(ShipmentStatus::Delivered));
}

#[test]
fn delivered_never_regresses_on_stale_events() {
    for stale in [EventStatus::Departed, EventStatus::Arrived, EventStatus::Discharged] {
        let next = ShipmentFlow::advance_on_carrier(ShipmentStatus::Delivered, stale, false);
        assert_eq!(next, None);
    }
}

#[test]
fn regression_guard_orders_statuses() {
    assert!(ShipmentFlow::is_regression(ShipmentStatus::Delivered, ShipmentStatus::InTransit));
    assert!(!ShipmentFlow::is_regression(ShipmentStatus::DocsPending, ShipmentStatus::Arrived));
}

#[test]
fn archive_round_trip_is_admin_only_semantics() {
    let archived =
        ShipmentFlow::apply(ShipmentStatus::Delivered, ShipmentEvent::AdminArchive).unwrap();
    assert_eq!(archived, ShipmentStatus::Archived);
    let restored = ShipmentFlow::apply(archived, ShipmentEvent::AdminUnarchive).unwrap();
    assert_eq!(restored, ShipmentStatus::Delivered);
}

#[test]
fn draft_rejects_required_docs_complete() {
    assert!(ShipmentFlow::apply(ShipmentStatus::Draft, ShipmentEvent::RequiredDocsComplete)
        .is_err());
}
