// tracehub-auditpack/src/assembler/tests.rs
// ============================================================================
// Module: Audit Pack Unit Tests
// Description: Tests for archive determinism, ordering, and content.
// Purpose: Pin the entry list and byte-for-byte reproducibility.
// Dependencies: tracehub-auditpack, zip
// ============================================================================

//! ## Overview
//! Two assemblies of the same input must produce identical bytes; entries
//! follow the fixed document order; metadata carries per-document checksums.

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

use std::io::Cursor;
use std::io::Read;

use tracehub_core::ContainerEvent;
use tracehub_core::Decision;
use tracehub_core::Document;
use tracehub_core::DocumentStatus;
use tracehub_core::DocumentType;
use tracehub_core::EventId;
use tracehub_core::EventSource;
use tracehub_core::EventStatus;
use tracehub_core::OrgId;
use tracehub_core::OrgStatus;
use tracehub_core::OrgType;
use tracehub_core::Organization;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::Timestamp;
use tracehub_core::org::OrgSettings;
use zip::ZipArchive;

use super::AuditPackInput;
use super::DocumentEntry;
use super::assemble;
use super::pack_file_name;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed generation instant.
const T0: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

/// Builds a document entry of the given id and type.
fn entry(id: u64, document_type: DocumentType, bytes: &[u8]) -> DocumentEntry {
    DocumentEntry {
        document: Document {
            id: tracehub_core::DocumentId::from_raw(id).unwrap(),
            shipment_id: ShipmentId::from_raw(1).unwrap(),
            organization_id: Some(OrgId::from_raw(1).unwrap()),
            document_type,
            status: DocumentStatus::Linked,
            file_name: "file.pdf".to_string(),
            file_path: "documents/1/1/file.pdf".to_string(),
            file_size: bytes.len() as u64,
            mime_type: "application/pdf".to_string(),
            checksum: None,
            reference_number: Some(format!("REF-{id}")),
            issue_date: None,
            expiry_date: None,
            issuing_authority: None,
            canonical_data: None,
            version: 1,
            is_primary: true,
            supersedes_id: None,
            classification_confidence: None,
            parsed_at: None,
            last_validated_at: None,
            created_at: T0,
        },
        bytes: bytes.to_vec(),
    }
}

/// Builds a complete assembly input.
fn input() -> AuditPackInput {
    let organization = Organization {
        id: OrgId::from_raw(1).unwrap(),
        name: "VIBOTAJ Global".to_string(),
        slug: "vibotaj".to_string(),
        org_type: OrgType::Supplier,
        status: OrgStatus::Active,
        contact_email: None,
        address: None,
        settings: OrgSettings::default(),
        created_at: T0,
    };
    AuditPackInput {
        shipment: tracehub_core::Shipment {
            id: ShipmentId::from_raw(1).unwrap(),
            organization_id: organization.id,
            buyer_organization_id: None,
            reference: "VIBO-2026-001".to_string(),
            container_number: Some("MSCU1234567".to_string()),
            product_type: "horn_hoof".to_string(),
            bl_number: Some("APU058043".to_string()),
            vessel: Some("MSC AURORA".to_string()),
            voyage: Some("AW428A".to_string()),
            pol_code: Some("NGAPP".to_string()),
            pol_name: Some("Apapa".to_string()),
            pod_code: Some("DEHAM".to_string()),
            pod_name: Some("Hamburg".to_string()),
            etd: None,
            eta: None,
            atd: None,
            ata: None,
            incoterms: Some("CIF".to_string()),
            status: ShipmentStatus::InTransit,
            is_historical: false,
            tracking_error: None,
            delivered_at: None,
            created_at: T0,
        },
        organization,
        buyer: None,
        products: Vec::new(),
        origins: Vec::new(),
        documents: vec![
            // Deliberately out of pack order to exercise sorting.
            entry(3, DocumentType::CertificateOfOrigin, b"coo-bytes"),
            entry(1, DocumentType::BillOfLading, b"bol-bytes"),
            entry(2, DocumentType::CommercialInvoice, b"invoice-bytes"),
        ],
        events: vec![ContainerEvent {
            id: EventId::from_raw(1).unwrap(),
            shipment_id: ShipmentId::from_raw(1).unwrap(),
            event_status: EventStatus::Departed,
            event_time: Timestamp::parse_rfc3339("2026-02-15T10:00:00Z").unwrap(),
            location_code: Some("NGAPP".to_string()),
            location_name: Some("Apapa".to_string()),
            vessel: Some("MSC AURORA".to_string()),
            voyage: Some("AW428A".to_string()),
            source: EventSource::new("carrier-api"),
            raw_payload: None,
            ingested_at: T0,
        }],
        required_documents: vec![
            DocumentType::BillOfLading,
            DocumentType::CommercialInvoice,
            DocumentType::PackingList,
        ],
        eudr_applicable: false,
        decision: Some(Decision::Approve),
        generated_at: T0,
    }
}

/// Lists entry names in archive order.
fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn assembly_is_byte_deterministic() {
    let input = input();
    let first = assemble(&input).unwrap();
    let second = assemble(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn only_the_index_pdf_varies_with_the_generation_instant() {
    let first_input = input();
    let mut second_input = input();
    second_input.generated_at = T0.plus_millis(3_600_000);

    let first = assemble(&first_input).unwrap();
    let second = assemble(&second_input).unwrap();

    let mut first_archive = ZipArchive::new(Cursor::new(first)).unwrap();
    let mut second_archive = ZipArchive::new(Cursor::new(second)).unwrap();
    assert_eq!(first_archive.len(), second_archive.len());
    for index in 0..first_archive.len() {
        let name = first_archive.by_index(index).unwrap().name().to_string();
        let mut first_bytes = Vec::new();
        first_archive.by_index(index).unwrap().read_to_end(&mut first_bytes).unwrap();
        let mut second_bytes = Vec::new();
        second_archive.by_index(index).unwrap().read_to_end(&mut second_bytes).unwrap();
        if name == "00-SHIPMENT-INDEX.pdf" {
            assert_ne!(first_bytes, second_bytes, "index must carry the new instant");
        } else {
            assert_eq!(first_bytes, second_bytes, "{name} must not vary with the instant");
        }
    }
}

#[test]
fn entries_follow_the_fixed_order() {
    let bytes = assemble(&input()).unwrap();
    assert_eq!(
        entry_names(&bytes),
        vec![
            "00-SHIPMENT-INDEX.pdf".to_string(),
            "01-bill-of-lading.pdf".to_string(),
            "02-commercial-invoice.pdf".to_string(),
            "03-certificate-of-origin.pdf".to_string(),
            "container-tracking-log.json".to_string(),
            "metadata.json".to_string(),
        ]
    );
}

#[test]
fn document_bytes_survive_verbatim() {
    let bytes = assemble(&input()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = Vec::new();
    archive.by_name("01-bill-of-lading.pdf").unwrap().read_to_end(&mut content).unwrap();
    assert_eq!(content, b"bol-bytes");
}

#[test]
fn metadata_carries_checksums_and_decision() {
    let bytes = assemble(&input()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive.by_name("metadata.json").unwrap().read_to_string(&mut content).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["decision"], "APPROVE");
    assert_eq!(value["documents"].as_array().unwrap().len(), 3);
    for document in value["documents"].as_array().unwrap() {
        assert_eq!(document["checksum"].as_str().unwrap().len(), 64);
    }
}

#[test]
fn missing_required_documents_are_marked_in_the_index() {
    let bytes = assemble(&input()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = Vec::new();
    archive.by_name("00-SHIPMENT-INDEX.pdf").unwrap().read_to_end(&mut content).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("[x] bill-of-lading"));
    assert!(text.contains("[ ] packing-list"));
}

#[test]
fn pack_file_name_slugs_the_reference() {
    assert_eq!(pack_file_name("VIBO-2026-001"), "vibo-2026-001-audit-pack.zip");
}
