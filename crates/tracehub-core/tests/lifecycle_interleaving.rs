// tracehub-core/tests/lifecycle_interleaving.rs
// ============================================================================
// Module: Lifecycle Interleaving Tests
// Description: Tests for shipment derivation under interleaved inputs.
// Purpose: Verify the document path and event path commute.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Given a fixed set of document-completeness milestones and carrier events,
//! deriving the shipment status after any arrival interleaving must yield the
//! same final status, because both paths converge through
//! `ShipmentFlow::derive` over the full history.

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

use tracehub_core::EventStatus;
use tracehub_core::ShipmentFlow;
use tracehub_core::ShipmentStatus;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// One lifecycle input in the interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    /// First document uploaded.
    DocsUploaded,
    /// Required document set completed.
    DocsComplete,
    /// Carrier event ingested (carries its time-ordered position).
    Carrier(EventStatus),
}

/// Replays an arrival order through the derivation used by both paths.
///
/// Each step re-derives from the accumulated history, exactly as the store
/// does after every document mutation and every event insert; carrier events
/// keep their time order regardless of arrival order.
fn replay(arrivals: &[Input], event_time_order: &[EventStatus]) -> ShipmentStatus {
    let mut docs_uploaded = false;
    let mut docs_complete = false;
    let mut seen: Vec<EventStatus> = Vec::new();
    let mut status = ShipmentStatus::Draft;
    for arrival in arrivals {
        match arrival {
            Input::DocsUploaded => docs_uploaded = true,
            Input::DocsComplete => {
                docs_uploaded = true;
                docs_complete = true;
            }
            Input::Carrier(event) => seen.push(*event),
        }
        // Events are replayed in event-time order, not arrival order.
        let ordered: Vec<EventStatus> =
            event_time_order.iter().copied().filter(|e| seen.contains(e)).collect();
        let derived = ShipmentFlow::derive(docs_uploaded, docs_complete, &ordered);
        if !ShipmentFlow::is_regression(status, derived) {
            status = derived;
        }
    }
    status
}

/// Generates every interleaving of two ordered sequences.
fn interleavings(a: &[Input], b: &[Input]) -> Vec<Vec<Input>> {
    if a.is_empty() {
        return vec![b.to_vec()];
    }
    if b.is_empty() {
        return vec![a.to_vec()];
    }
    let mut out = Vec::new();
    for mut tail in interleavings(&a[1..], b) {
        tail.insert(0, a[0]);
        out.push(tail);
    }
    for mut tail in interleavings(a, &b[1..]) {
        tail.insert(0, b[0]);
        out.push(tail);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn doc_and_event_paths_commute_to_delivered() {
    let doc_path = [Input::DocsUploaded, Input::DocsComplete];
    let events = [EventStatus::Departed, EventStatus::Arrived, EventStatus::Delivered];
    let event_path: Vec<Input> = events.iter().map(|e| Input::Carrier(*e)).collect();

    let mut outcomes: Vec<ShipmentStatus> = interleavings(&doc_path, &event_path)
        .iter()
        .map(|arrivals| replay(arrivals, &events))
        .collect();
    outcomes.sort_unstable();
    outcomes.dedup();
    assert_eq!(outcomes, vec![ShipmentStatus::Delivered]);
}

#[test]
fn customs_sequence_commutes() {
    let doc_path = [Input::DocsUploaded, Input::DocsComplete];
    let events = [
        EventStatus::Departed,
        EventStatus::Arrived,
        EventStatus::CustomsHold,
        EventStatus::CustomsReleased,
        EventStatus::GateOut,
    ];
    let event_path: Vec<Input> = events.iter().map(|e| Input::Carrier(*e)).collect();

    let mut outcomes: Vec<ShipmentStatus> = interleavings(&doc_path, &event_path)
        .iter()
        .map(|arrivals| replay(arrivals, &events))
        .collect();
    outcomes.sort_unstable();
    outcomes.dedup();
    assert_eq!(outcomes, vec![ShipmentStatus::Delivered]);
}

#[test]
fn incomplete_documents_hold_the_shipment() {
    let events = [EventStatus::Departed, EventStatus::Arrived];
    let status = ShipmentFlow::derive(true, false, &events);
    assert_eq!(status, ShipmentStatus::DocsPending);
}

#[test]
fn stale_events_after_delivery_change_nothing() {
    let events = [
        EventStatus::Departed,
        EventStatus::Arrived,
        EventStatus::Delivered,
        EventStatus::Departed,
        EventStatus::InTransit,
    ];
    assert_eq!(ShipmentFlow::derive(true, true, &events), ShipmentStatus::Delivered);
}
