// tracehub-core/src/runtime/enrichment/tests.rs
// ============================================================================
// Module: BoL Enrichment Unit Tests
// Description: Tests for the authoritative back-fill contract.
// Purpose: Pin the overwrite policy per shipment column.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises the enrichment contract: B/L number always wins, container only
//! replaces placeholders, routing columns fill only when empty.

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

use super::enrich_from_bol;
use super::extract_unlocode;
use crate::core::document::ParsedBol;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::ShipmentId;
use crate::core::shipment::Shipment;
use crate::core::shipment::ShipmentStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a shipment fixture with empty routing columns.
fn empty_shipment() -> Shipment {
    Shipment {
        id: ShipmentId::from_raw(1).unwrap(),
        organization_id: OrgId::from_raw(1).unwrap(),
        buyer_organization_id: None,
        reference: "VIBO-2026-001".to_string(),
        container_number: None,
        product_type: "horn_hoof".to_string(),
        bl_number: None,
        vessel: None,
        voyage: None,
        pol_code: None,
        pol_name: None,
        pod_code: None,
        pod_name: None,
        etd: None,
        eta: None,
        atd: None,
        ata: None,
        incoterms: None,
        status: ShipmentStatus::DocsPending,
        is_historical: false,
        tracking_error: None,
        delivered_at: None,
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
    }
}

/// Builds a parsed BoL fixture covering every enrichable column.
fn parsed() -> ParsedBol {
    ParsedBol {
        schema_version: 1,
        shipper: Some("VIBOTAJ Global".to_string()),
        consignee: Some("HAGES GmbH".to_string()),
        bol_number: Some("APU058043".to_string()),
        containers: vec!["MSCU1234567".to_string()],
        cargo_items: Vec::new(),
        port_of_loading: Some("Apapa (NGAPP)".to_string()),
        port_of_discharge: Some("DEHAM".to_string()),
        shipped_on_board: Some(Timestamp::parse_rfc3339("2026-02-15T10:00:00Z").unwrap()),
        vessel: Some("MSC AURORA".to_string()),
        voyage: Some("AW428A".to_string()),
        confidence: 0.92,
        sidecar: None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn empty_shipment_fills_every_column() {
    let mut shipment = empty_shipment();
    let outcome = enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.bl_number.as_deref(), Some("APU058043"));
    assert_eq!(shipment.container_number.as_deref(), Some("MSCU1234567"));
    assert_eq!(shipment.vessel.as_deref(), Some("MSC AURORA"));
    assert_eq!(shipment.voyage.as_deref(), Some("AW428A"));
    assert_eq!(shipment.pol_code.as_deref(), Some("NGAPP"));
    assert_eq!(shipment.pod_code.as_deref(), Some("DEHAM"));
    assert!(shipment.atd.is_some());
    assert!(outcome.changed());
}

#[test]
fn bl_number_is_always_overwritten() {
    let mut shipment = empty_shipment();
    shipment.bl_number = Some("OLD-REF".to_string());
    enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.bl_number.as_deref(), Some("APU058043"));
}

#[test]
fn placeholder_container_is_replaced() {
    let mut shipment = empty_shipment();
    shipment.container_number = Some("VIBO-CNT-0001".to_string());
    enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.container_number.as_deref(), Some("MSCU1234567"));
}

#[test]
fn lowercase_placeholder_container_is_replaced() {
    let mut shipment = empty_shipment();
    shipment.container_number = Some("vibo-cnt-0001".to_string());
    enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.container_number.as_deref(), Some("MSCU1234567"));
}

#[test]
fn real_container_is_preserved() {
    let mut shipment = empty_shipment();
    shipment.container_number = Some("TGHU7654321".to_string());
    let outcome = enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.container_number.as_deref(), Some("TGHU7654321"));
    assert!(!outcome.changed_fields.contains(&"container_number"));
}

#[test]
fn populated_routing_columns_are_preserved() {
    let mut shipment = empty_shipment();
    shipment.vessel = Some("GLORY STAR".to_string());
    shipment.pol_code = Some("NGLOS".to_string());
    enrich_from_bol(&mut shipment, &parsed());
    assert_eq!(shipment.vessel.as_deref(), Some("GLORY STAR"));
    assert_eq!(shipment.pol_code.as_deref(), Some("NGLOS"));
}

#[test]
fn unlocode_extraction_finds_five_letter_token() {
    assert_eq!(extract_unlocode("Apapa (NGAPP)").as_deref(), Some("NGAPP"));
    assert_eq!(extract_unlocode("DEHAM").as_deref(), Some("DEHAM"));
    assert_eq!(extract_unlocode("Hamburg").as_deref(), None);
    assert_eq!(extract_unlocode("").as_deref(), None);
}

#[test]
fn enrichment_is_idempotent() {
    let mut shipment = empty_shipment();
    enrich_from_bol(&mut shipment, &parsed());
    let outcome = enrich_from_bol(&mut shipment, &parsed());
    assert!(!outcome.changed());
}
