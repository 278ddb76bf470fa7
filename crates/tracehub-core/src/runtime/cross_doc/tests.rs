// tracehub-core/src/runtime/cross_doc/tests.rs
// ============================================================================
// Module: Cross-Document Rules Unit Tests
// Description: Tests for XD-* agreement rules and the weight tolerance.
// Purpose: Pin BoL authority on container/B/L and the ±1% weight policy.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Exercises cross-document agreement: container and B/L mismatches escalate
//! to ERROR because the Bill of Lading is authoritative; weight disagreement
//! within tolerance passes.

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

use super::CROSS_DOC_RULES;
use crate::core::document::CanonicalData;
use crate::core::document::Document;
use crate::core::document::DocumentStatus;
use crate::core::document::DocumentType;
use crate::core::document::PackingListFields;
use crate::core::document::ParsedBol;
use crate::core::document::Severity;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::ShipmentId;
use crate::core::shipment::Shipment;
use crate::core::shipment::ShipmentStatus;
use crate::core::time::Timestamp;
use crate::runtime::rules::RuleContext;

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

/// Builds a document row of the given type and payload.
fn document(id: u64, document_type: DocumentType, data: CanonicalData) -> Document {
    Document {
        id: DocumentId::from_raw(id).unwrap(),
        shipment_id: ShipmentId::from_raw(1).unwrap(),
        organization_id: Some(OrgId::from_raw(1).unwrap()),
        document_type,
        status: DocumentStatus::Validated,
        file_name: "doc.pdf".to_string(),
        file_path: "documents/1/1/doc.pdf".to_string(),
        file_size: 512,
        mime_type: "application/pdf".to_string(),
        checksum: None,
        reference_number: None,
        issue_date: None,
        expiry_date: None,
        issuing_authority: None,
        canonical_data: Some(data),
        version: 1,
        is_primary: true,
        supersedes_id: None,
        classification_confidence: None,
        parsed_at: None,
        last_validated_at: None,
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
    }
}

/// Builds a BoL payload naming the given container.
fn bol_with_container(container: &str) -> CanonicalData {
    CanonicalData::Bol(ParsedBol {
        schema_version: 1,
        shipper: Some("VIBOTAJ Global".to_string()),
        consignee: Some("HAGES GmbH".to_string()),
        bol_number: Some("APU058043".to_string()),
        containers: vec![container.to_string()],
        cargo_items: Vec::new(),
        port_of_loading: Some("NGAPP".to_string()),
        port_of_discharge: Some("DEHAM".to_string()),
        shipped_on_board: None,
        vessel: None,
        voyage: None,
        confidence: 0.9,
        sidecar: None,
    })
}

/// Builds a packing list payload naming the given container and weight.
fn packing_list(container: &str, net_kg: f64) -> CanonicalData {
    CanonicalData::PackingList(PackingListFields {
        schema_version: 1,
        container_number: Some(container.to_string()),
        net_weight_kg: Some(net_kg),
        gross_weight_kg: None,
        packages: Some(400),
        sidecar: None,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn container_mismatch_is_an_error() {
    let ship = shipment();
    let docs = vec![
        document(1, DocumentType::BillOfLading, bol_with_container("MSCU1234567")),
        document(2, DocumentType::PackingList, packing_list("TGHU7654321", 24_000.0)),
    ];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = CROSS_DOC_RULES.iter().find(|d| d.id == "XD-001").unwrap();
    let result = (def.run)(def, &ctx);
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Error);
    assert_eq!(result.expected.as_deref(), Some("MSCU1234567"));
}

#[test]
fn container_agreement_passes() {
    let ship = shipment();
    let docs = vec![
        document(1, DocumentType::BillOfLading, bol_with_container("MSCU1234567")),
        document(2, DocumentType::PackingList, packing_list("MSCU1234567", 24_000.0)),
    ];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = CROSS_DOC_RULES.iter().find(|d| d.id == "XD-001").unwrap();
    assert!(((def.run)(def, &ctx)).passed);
}

#[test]
fn weight_within_one_percent_passes() {
    let ship = shipment();
    let invoice = CanonicalData::Invoice(crate::core::document::InvoiceFields {
        schema_version: 1,
        invoice_number: Some("INV-2026-014".to_string()),
        container_number: None,
        net_weight_kg: Some(24_120.0),
        currency: Some("EUR".to_string()),
        total_amount: Some(48_000.0),
        sidecar: None,
    });
    let docs = vec![
        document(1, DocumentType::CommercialInvoice, invoice),
        document(2, DocumentType::PackingList, packing_list("MSCU1234567", 24_000.0)),
    ];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = CROSS_DOC_RULES.iter().find(|d| d.id == "XD-002").unwrap();
    assert!(((def.run)(def, &ctx)).passed);
}

#[test]
fn weight_outside_one_percent_warns() {
    let ship = shipment();
    let invoice = CanonicalData::Invoice(crate::core::document::InvoiceFields {
        schema_version: 1,
        invoice_number: Some("INV-2026-014".to_string()),
        container_number: None,
        net_weight_kg: Some(25_000.0),
        currency: Some("EUR".to_string()),
        total_amount: Some(48_000.0),
        sidecar: None,
    });
    let docs = vec![
        document(1, DocumentType::CommercialInvoice, invoice),
        document(2, DocumentType::PackingList, packing_list("MSCU1234567", 24_000.0)),
    ];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    let def = CROSS_DOC_RULES.iter().find(|d| d.id == "XD-002").unwrap();
    let result = (def.run)(def, &ctx);
    assert!(!result.passed);
    assert_eq!(result.severity, Severity::Warning);
}

#[test]
fn missing_counterpart_documents_pass_trivially() {
    let ship = shipment();
    let docs = vec![document(1, DocumentType::BillOfLading, bol_with_container("MSCU1234567"))];
    let ctx = RuleContext {
        shipment: &ship,
        products: &[],
        origins: &[],
        documents: &docs,
    };
    for def in CROSS_DOC_RULES {
        assert!(((def.run)(def, &ctx)).passed, "{} should pass trivially", def.id);
    }
}
