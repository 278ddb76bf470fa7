// tracehub-core/src/runtime/rules/tests.rs
// ============================================================================
// Module: BoL Rules Unit Tests
// Description: Tests for the placeholder predicate and BOL-001..BOL-011.
// Purpose: Pin rule outcomes for canonical and degenerate BoL extractions.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises the canonical BoL rule set against a well-formed extraction and
//! against placeholder-ridden inputs.

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

use super::BOL_RULES;
use super::RuleContext;
use super::is_placeholder;
use crate::core::document::BolCargoItem;
use crate::core::document::CanonicalData;
use crate::core::document::Document;
use crate::core::document::DocumentStatus;
use crate::core::document::DocumentType;
use crate::core::document::ParsedBol;
use crate::core::document::Severity;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::ShipmentId;
use crate::core::shipment::Shipment;
use crate::core::shipment::ShipmentStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a minimal shipment fixture.
fn shipment() -> Shipment {
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

/// Builds a well-formed parsed BoL fixture.
fn good_bol() -> ParsedBol {
    ParsedBol {
        schema_version: 1,
        shipper: Some("VIBOTAJ Global".to_string()),
        consignee: Some("HAGES GmbH".to_string()),
        bol_number: Some("APU058043".to_string()),
        containers: vec!["MSCU1234567".to_string()],
        cargo_items: vec![BolCargoItem {
            description: "Dried horn and hoof".to_string(),
            packages: Some(400),
            gross_weight_kg: Some(24_000.0),
        }],
        port_of_loading: Some("NGAPP".to_string()),
        port_of_discharge: Some("DEHAM".to_string()),
        shipped_on_board: None,
        vessel: Some("MSC AURORA".to_string()),
        voyage: Some("AW428A".to_string()),
        confidence: 0.92,
        sidecar: None,
    }
}

/// Wraps a parsed BoL into a primary document row.
fn bol_document(parsed: ParsedBol) -> Document {
    Document {
        id: DocumentId::from_raw(10).unwrap(),
        shipment_id: ShipmentId::from_raw(1).unwrap(),
        organization_id: Some(OrgId::from_raw(1).unwrap()),
        document_type: DocumentType::BillOfLading,
        status: DocumentStatus::Validated,
        file_name: "bol.pdf".to_string(),
        file_path: "documents/1/1/bol.pdf".to_string(),
        file_size: 1024,
        mime_type: "application/pdf".to_string(),
        checksum: None,
        reference_number: parsed.bol_number.clone(),
        issue_date: None,
        expiry_date: None,
        issuing_authority: None,
        canonical_data: Some(CanonicalData::Bol(parsed)),
        version: 1,
        is_primary: true,
        supersedes_id: None,
        classification_confidence: Some(0.92),
        parsed_at: None,
        last_validated_at: None,
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn placeholder_predicate_matches_canonical_tokens() {
    for token in ["TBD", "tbc", "PENDING", "placeholder", "N/A", "na", "", "  "] {
        assert!(is_placeholder(token), "{token:?} should be a placeholder");
    }
    assert!(is_placeholder("VIBO-CNT-0001"));
    assert!(!is_placeholder("MSCU1234567"));
    assert!(!is_placeholder("VIBOTAJ Global"));
}

#[test]
fn placeholder_wildcard_is_case_insensitive() {
    for value in ["vibo-cnt-0001", "Vibo-Cnt-0001", "vibo-CNT-0001"] {
        assert!(is_placeholder(value), "{value:?} should be a placeholder");
    }
}

#[test]
fn well_formed_bol_passes_every_rule() {
    let ship = shipment();
    let doc = bol_document(good_bol());
    let docs = vec![doc];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    for def in BOL_RULES {
        let result = (def.run)(def, &ctx);
        assert!(result.passed, "{} should pass: {}", def.id, result.message);
    }
}

#[test]
fn unknown_shipper_fails_bol_001_with_error() {
    let ship = shipment();
    let mut bol = good_bol();
    bol.shipper = Some("Unknown Shipper".to_string());
    let doc = bol_document(bol);
    let docs = vec![doc];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = &BOL_RULES[0];
    let result = (def.run)(def, &ctx);
    assert_eq!(result.rule_id, "BOL-001");
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Error);
}

#[test]
fn malformed_container_fails_bol_003_with_warning() {
    let ship = shipment();
    let mut bol = good_bol();
    bol.containers = vec!["MSC-128".to_string()];
    let doc = bol_document(bol);
    let docs = vec![doc];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = &BOL_RULES[2];
    let result = (def.run)(def, &ctx);
    assert_eq!(result.rule_id, "BOL-003");
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Warning);
}

#[test]
fn low_confidence_fails_bol_011_with_info() {
    let ship = shipment();
    let mut bol = good_bol();
    bol.confidence = 0.31;
    let doc = bol_document(bol);
    let docs = vec![doc];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = &BOL_RULES[10];
    let result = (def.run)(def, &ctx);
    assert_eq!(result.rule_id, "BOL-011");
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Info);
}

#[test]
fn missing_bol_falls_back_to_shipment_columns() {
    let mut ship = shipment();
    ship.bl_number = Some("APU058043".to_string());
    ship.container_number = Some("MSCU1234567".to_string());
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &[],
    };
    let bol_number = &BOL_RULES[3];
    assert!(((bol_number.run)(bol_number, &ctx)).passed);
    let container = &BOL_RULES[6];
    assert!(((container.run)(container, &ctx)).passed);
}
