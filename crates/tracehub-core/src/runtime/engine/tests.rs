// tracehub-core/src/runtime/engine/tests.rs
// ============================================================================
// Module: Rules Engine Unit Tests
// Description: Tests for evaluation ordering, aggregation, and overrides.
// Purpose: Pin decision semantics for the canonical scenarios.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises the engine against the horn/hoof happy path, the placeholder
//! rejection path, the EUDR incomplete/complete paths, and override
//! re-application.

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

use super::Decision;
use super::EvaluationInput;
use super::RulesEngine;
use crate::core::document::BolCargoItem;
use crate::core::document::CanonicalData;
use crate::core::document::Document;
use crate::core::document::DocumentIssue;
use crate::core::document::DocumentStatus;
use crate::core::document::DocumentType;
use crate::core::document::ParsedBol;
use crate::core::document::Severity;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::IssueId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::OriginId;
use crate::core::identifiers::ProductId;
use crate::core::identifiers::ShipmentId;
use crate::core::shipment::Geolocation;
use crate::core::shipment::Origin;
use crate::core::shipment::Product;
use crate::core::shipment::Shipment;
use crate::core::shipment::ShipmentStatus;
use crate::core::time::Timestamp;
use crate::runtime::matrix::ComplianceMatrix;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed evaluation instant for deterministic assertions.
const NOW: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

/// Builds a shipment fixture for the given product type.
fn shipment(product_type: &str) -> Shipment {
    Shipment {
        id: ShipmentId::from_raw(1).unwrap(),
        organization_id: OrgId::from_raw(1).unwrap(),
        buyer_organization_id: Some(OrgId::from_raw(2).unwrap()),
        reference: "VIBO-2026-001".to_string(),
        container_number: None,
        product_type: product_type.to_string(),
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
        incoterms: Some("CIF".to_string()),
        status: ShipmentStatus::DocsPending,
        is_historical: false,
        tracking_error: None,
        delivered_at: None,
        created_at: NOW,
    }
}

/// Builds a product fixture for the given HS code.
fn product(hs_code: &str) -> Product {
    Product {
        id: ProductId::from_raw(1).unwrap(),
        shipment_id: ShipmentId::from_raw(1).unwrap(),
        organization_id: OrgId::from_raw(1).unwrap(),
        hs_code: hs_code.to_string(),
        description: "cargo".to_string(),
        quantity_net_kg: Some(24_000.0),
        quantity_gross_kg: Some(24_400.0),
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
            gross_weight_kg: Some(24_400.0),
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
        created_at: NOW,
    }
}

/// Builds an origin attestation that satisfies every EUDR rule.
fn good_origin() -> Origin {
    Origin {
        id: OriginId::from_raw(1).unwrap(),
        shipment_id: ShipmentId::from_raw(1).unwrap(),
        product_id: ProductId::from_raw(1).unwrap(),
        organization_id: OrgId::from_raw(1).unwrap(),
        farm_plot_identifier: "NG-OG-00042".to_string(),
        geolocation: Geolocation {
            lat: 6.5244,
            lng: 3.3792,
            polygon: None,
        },
        country: "NG".to_string(),
        production_start_date: Some(Timestamp::parse_rfc3339("2022-03-01T00:00:00Z").unwrap()),
        production_end_date: None,
        deforestation_free_statement: Some("attested".to_string()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn horn_hoof_happy_path_approves_without_eudr_results() {
    let matrix = ComplianceMatrix::builtin();
    let engine = RulesEngine::new(&matrix);
    let input = EvaluationInput {
        shipment: shipment("horn_hoof"),
        products: vec![product("0506.90")],
        origins: Vec::new(),
        documents: vec![bol_document(good_bol())],
        prior_issues: Vec::new(),
    };
    let report = engine.evaluate(&input, NOW);
    assert_eq!(report.decision, Decision::Approve);
    assert_eq!(report.active_failures, 0);
    assert!(report.results.iter().all(|r| !r.rule_id.starts_with("EUDR-")));
}

#[test]
fn unknown_shipper_rejects() {
    let matrix = ComplianceMatrix::builtin();
    let engine = RulesEngine::new(&matrix);
    let mut bol = good_bol();
    bol.shipper = Some("Unknown Shipper".to_string());
    let input = EvaluationInput {
        shipment: shipment("horn_hoof"),
        products: vec![product("0506.90")],
        origins: Vec::new(),
        documents: vec![bol_document(bol)],
        prior_issues: Vec::new(),
    };
    let report = engine.evaluate(&input, NOW);
    assert_eq!(report.decision, Decision::Reject);
    let failure = report.results.iter().find(|r| r.rule_id == "BOL-001").unwrap();
    assert!(!failure.passed);
    assert_eq!(failure.severity, Severity::Error);
}

#[test]
fn cocoa_without_origin_rejects_then_approves_with_origin() {
    let matrix = ComplianceMatrix::builtin();
    let engine = RulesEngine::new(&matrix);
    let mut input = EvaluationInput {
        shipment: shipment("cocoa"),
        products: vec![product("1801.00")],
        origins: Vec::new(),
        documents: vec![bol_document(good_bol())],
        prior_issues: Vec::new(),
    };
    let report = engine.evaluate(&input, NOW);
    assert_eq!(report.decision, Decision::Reject);
    let geo = report.results.iter().find(|r| r.rule_id == "EUDR-GEO").unwrap();
    assert!(!geo.passed);

    input.origins = vec![good_origin()];
    let report = engine.evaluate(&input, NOW);
    assert!(report.results.iter().filter(|r| r.rule_id.starts_with("EUDR-")).all(|r| r.passed));
    assert_eq!(report.decision, Decision::Approve);
}

#[test]
fn results_are_ordered_and_repeatable() {
    let matrix = ComplianceMatrix::builtin();
    let engine = RulesEngine::new(&matrix);
    let input = EvaluationInput {
        shipment: shipment("cocoa"),
        products: vec![product("1801.00")],
        origins: vec![good_origin()],
        documents: vec![bol_document(good_bol())],
        prior_issues: Vec::new(),
    };
    let first = engine.evaluate(&input, NOW);
    let second = engine.evaluate(&input, NOW);
    assert_eq!(first, second);
    let ids: Vec<&str> = first.results.iter().map(|r| r.rule_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn override_suppresses_failure_on_reevaluation() {
    let matrix = ComplianceMatrix::builtin();
    let engine = RulesEngine::new(&matrix);
    let mut bol = good_bol();
    bol.containers = vec!["BAD-123".to_string()];
    let input = EvaluationInput {
        shipment: shipment("horn_hoof"),
        products: vec![product("0506.90")],
        origins: Vec::new(),
        documents: vec![bol_document(bol)],
        prior_issues: vec![DocumentIssue {
            id: IssueId::from_raw(1).unwrap(),
            document_id: DocumentId::from_raw(10).unwrap(),
            shipment_id: ShipmentId::from_raw(1).unwrap(),
            rule_id: "BOL-003".to_string(),
            rule_name: "Container number format".to_string(),
            severity: Severity::Warning,
            message: "container number does not match ISO 6346".to_string(),
            field: Some("container_number".to_string()),
            expected_value: None,
            actual_value: None,
            is_overridden: true,
            overridden_by: None,
            override_reason: Some("carrier-issued interim number".to_string()),
        }],
    };
    let report = engine.evaluate(&input, NOW);
    let result = report.results.iter().find(|r| r.rule_id == "BOL-003").unwrap();
    assert!(!result.passed);
    assert!(result.overridden);
    assert_eq!(report.decision, Decision::Approve);
}
