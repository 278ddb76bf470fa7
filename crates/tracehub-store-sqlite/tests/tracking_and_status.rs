// tracehub-store-sqlite/tests/tracking_and_status.rs
// ============================================================================
// Module: Tracking & Status Derivation Tests
// Description: Event dedup, status recompute, and the EUDR origin guard.
// Purpose: Verify ingestion semantics against the seeded world.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Inserting the same `(shipment, status, time±60s, source)` twice yields one
//! row; status recompute derives from full history and never regresses; the
//! origin write guard rejects horn/hoof attestations.

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

mod helpers;

use helpers::T0;
use helpers::world;
use tracehub_core::ComplianceMatrix;
use tracehub_core::DocumentEvent;
use tracehub_core::EventSource;
use tracehub_core::EventStatus;
use tracehub_core::Geolocation;
use tracehub_core::NormalizedEvent;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::StoreError;
use tracehub_store_sqlite::TenantSession;
use tracehub_store_sqlite::documents::NewDocument;
use tracehub_store_sqlite::shipments::NewOrigin;
use tracehub_store_sqlite::shipments::NewProduct;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a departed event at the given instant.
fn departed(at: Timestamp) -> NormalizedEvent {
    NormalizedEvent {
        status: EventStatus::Departed,
        event_time: at,
        location_code: Some("NGAPP".to_string()),
        location_name: Some("Apapa".to_string()),
        vessel: Some("MSC AURORA".to_string()),
        voyage: Some("AW428A".to_string()),
        source: EventSource::new("carrier-api"),
        raw_payload: None,
    }
}

/// Uploads and fully links every document the horn/hoof matrix requires.
fn complete_documents(session: &TenantSession<'_>, shipment_id: ShipmentId) {
    let matrix = ComplianceMatrix::builtin();
    for (index, doc_type) in matrix.required_documents("horn_hoof").into_iter().enumerate() {
        let now = T0.plus_millis(i64::try_from(index).unwrap_or(0) * 1_000);
        let document = session
            .insert_document(
                &NewDocument {
                    shipment_id,
                    document_type: doc_type,
                    file_name: format!("doc-{index}.pdf"),
                    file_path: format!("documents/2/1/doc-{index}.pdf"),
                    file_size: 1_024,
                    mime_type: "application/pdf".to_string(),
                    checksum: format!("checksum-{index}"),
                    reference_number: Some(format!("REF-{index}")),
                    issue_date: None,
                    expiry_date: None,
                    issuing_authority: None,
                    canonical_data: None,
                    classification_confidence: None,
                },
                now,
            )
            .unwrap();
        session.transition_document(document.id, DocumentEvent::Approved, None, now).unwrap();
        session
            .transition_document(document.id, DocumentEvent::CompliancePassed, None, now)
            .unwrap();
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn duplicate_events_within_tolerance_collapse() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-020", false);
    let session = world.supplier_session();

    let first = session
        .insert_events_dedup(shipment_id, &[departed(T0)], T0)
        .unwrap();
    assert_eq!(first.len(), 1);

    // Same tuple, 30 seconds later: inside the 60-second tolerance.
    let second = session
        .insert_events_dedup(shipment_id, &[departed(T0.plus_millis(30_000))], T0.plus_millis(30_000))
        .unwrap();
    assert!(second.is_empty());

    let events = session.events_for_shipment(shipment_id).unwrap();
    assert_eq!(events.len(), 1);
}

#[test]
fn distinct_sources_do_not_collapse() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-021", false);
    let session = world.supplier_session();

    session.insert_events_dedup(shipment_id, &[departed(T0)], T0).unwrap();
    let mut other = departed(T0);
    other.source = EventSource::new("terminal-feed");
    let inserted = session.insert_events_dedup(shipment_id, &[other], T0).unwrap();
    assert_eq!(inserted.len(), 1);
}

#[test]
fn status_recompute_walks_the_event_path() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-022", false);
    let session = world.supplier_session();
    let matrix = ComplianceMatrix::builtin();

    complete_documents(&session, shipment_id);
    let change = session
        .recompute_shipment_status(shipment_id, &matrix, T0.plus_millis(60_000))
        .unwrap()
        .unwrap();
    assert_eq!(change.current, ShipmentStatus::DocsComplete);

    session
        .insert_events_dedup(shipment_id, &[departed(T0.plus_millis(70_000))], T0.plus_millis(70_000))
        .unwrap();
    let change = session
        .recompute_shipment_status(shipment_id, &matrix, T0.plus_millis(71_000))
        .unwrap()
        .unwrap();
    assert_eq!(change.previous, ShipmentStatus::DocsComplete);
    assert_eq!(change.current, ShipmentStatus::InTransit);

    // Recompute with no new inputs is a no-op.
    let unchanged = session
        .recompute_shipment_status(shipment_id, &matrix, T0.plus_millis(72_000))
        .unwrap();
    assert!(unchanged.is_none());
}

#[test]
fn horn_hoof_origin_attestations_are_rejected() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-023", false);
    let session = world.supplier_session();
    let product = session
        .add_product(
            &NewProduct {
                shipment_id,
                hs_code: "0506.90".to_string(),
                description: "Dried horn and hoof".to_string(),
                quantity_net_kg: Some(24_000.0),
                quantity_gross_kg: Some(24_400.0),
            },
            T0,
        )
        .unwrap();

    let err = session
        .add_origin(
            &NewOrigin {
                shipment_id,
                product_id: product.id,
                farm_plot_identifier: "NG-PLOT-1".to_string(),
                geolocation: Geolocation {
                    lat: 6.5244,
                    lng: 3.3792,
                    polygon: None,
                },
                country: "NG".to_string(),
                production_start_date: None,
                production_end_date: None,
                deforestation_free_statement: Some("attested".to_string()),
            },
            T0,
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::EudrExcluded(_)));
}

#[test]
fn pollable_shipments_require_container_and_clean_tracking() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-024", false);
    let session = world.supplier_session();
    let matrix = ComplianceMatrix::builtin();

    complete_documents(&session, shipment_id);
    session.recompute_shipment_status(shipment_id, &matrix, T0.plus_millis(60_000)).unwrap();

    // No container number yet: not pollable.
    assert!(world.admin_session().pollable_shipments().unwrap().is_empty());

    let mut shipment = session.get_shipment(shipment_id).unwrap();
    shipment.container_number = Some("MSCU1234567".to_string());
    session.update_shipment(&shipment, T0.plus_millis(61_000)).unwrap();
    assert_eq!(world.admin_session().pollable_shipments().unwrap().len(), 1);

    session
        .set_tracking_error(shipment_id, "container unknown to carrier", T0.plus_millis(62_000))
        .unwrap();
    assert!(world.admin_session().pollable_shipments().unwrap().is_empty());
}
