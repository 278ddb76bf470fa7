// tracehub-auditpack/src/assembler.rs
// ============================================================================
// Module: Audit Pack Assembler
// Description: Deterministic ZIP assembly for shipment audit packs.
// Purpose: Materialize the index, documents, tracking log, and metadata.
// Dependencies: serde_jcs, sha2, tracehub-core, zip
// ============================================================================

//! ## Overview
//! The assembler is a read-only consumer: callers gather the shipment, its
//! primary documents with their bytes, and the event history; the assembler
//! produces the archive. Entries are stored uncompressed with fixed
//! timestamps, documents follow the fixed type order, and both JSON entries
//! are canonical (RFC 8785), so identical inputs produce identical bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::io::Write;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracehub_core::ContainerEvent;
use tracehub_core::Decision;
use tracehub_core::Document;
use tracehub_core::DocumentType;
use tracehub_core::HashAlgorithm;
use tracehub_core::Organization;
use tracehub_core::Origin;
use tracehub_core::Product;
use tracehub_core::Shipment;
use tracehub_core::Timestamp;
use tracehub_core::hash_bytes;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::indexpdf::render_pdf;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Audit pack assembly errors.
#[derive(Debug, Error)]
pub enum PackError {
    /// Archive writing failed.
    #[error("audit pack write error: {0}")]
    Write(String),
    /// Canonical JSON serialization failed.
    #[error("audit pack serialization error: {0}")]
    Serialize(String),
    /// Timestamp rendering failed.
    #[error("audit pack time error: {0}")]
    Time(String),
}

// ============================================================================
// SECTION: Input
// ============================================================================

/// One primary document with its blob bytes.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    /// Document record.
    pub document: Document,
    /// File bytes fetched from the blob store.
    pub bytes: Vec<u8>,
}

/// Complete input for one assembly.
///
/// # Invariants
/// - `documents` holds primary versions only.
/// - `events` is ordered by event time.
#[derive(Debug, Clone)]
pub struct AuditPackInput {
    /// Shipment under review.
    pub shipment: Shipment,
    /// Owning organization.
    pub organization: Organization,
    /// Buyer organization when shared.
    pub buyer: Option<Organization>,
    /// Product lines.
    pub products: Vec<Product>,
    /// Origin attestations.
    pub origins: Vec<Origin>,
    /// Primary documents with bytes.
    pub documents: Vec<DocumentEntry>,
    /// Container event history.
    pub events: Vec<ContainerEvent>,
    /// Document types required by the compliance matrix.
    pub required_documents: Vec<DocumentType>,
    /// Whether EUDR due diligence applies to the shipment.
    pub eudr_applicable: bool,
    /// Latest compliance decision when one exists.
    pub decision: Option<Decision>,
    /// Index generation instant (a PDF field, not an archive timestamp).
    pub generated_at: Timestamp,
}

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Returns the archive file name for a shipment reference.
#[must_use]
pub fn pack_file_name(reference: &str) -> String {
    let slug: String = reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{slug}-audit-pack.zip")
}

/// Returns the file extension for a document entry.
fn entry_extension(document: &Document) -> &str {
    document.file_name.rsplit_once('.').map_or("pdf", |(_, ext)| ext)
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Fixed entry options: stored, fixed timestamp, unix permissions.
fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

/// Assembles the deterministic audit pack archive.
///
/// # Errors
///
/// Returns [`PackError`] when archive writing or serialization fails.
pub fn assemble(input: &AuditPackInput) -> Result<Vec<u8>, PackError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = entry_options();

    // 00: index PDF.
    let index = render_pdf(&index_lines(input)?);
    writer
        .start_file("00-SHIPMENT-INDEX.pdf", options)
        .map_err(|err| PackError::Write(err.to_string()))?;
    writer.write_all(&index).map_err(|err| PackError::Write(err.to_string()))?;

    // 01..NN: primary documents in the fixed type order.
    let mut ordered: Vec<&DocumentEntry> = input.documents.iter().collect();
    ordered.sort_by(|a, b| {
        let type_a = &a.document.document_type;
        let type_b = &b.document.document_type;
        type_a
            .pack_order()
            .cmp(&type_b.pack_order())
            .then_with(|| type_a.slug().cmp(&type_b.slug()))
            .then_with(|| a.document.id.cmp(&b.document.id))
    });
    for (index, entry) in ordered.iter().enumerate() {
        let name = format!(
            "{:02}-{}.{}",
            index + 1,
            entry.document.document_type.slug(),
            entry_extension(&entry.document)
        );
        writer.start_file(name, options).map_err(|err| PackError::Write(err.to_string()))?;
        writer.write_all(&entry.bytes).map_err(|err| PackError::Write(err.to_string()))?;
    }

    // Tracking log.
    let tracking = canonical_bytes(&input.events)?;
    writer
        .start_file("container-tracking-log.json", options)
        .map_err(|err| PackError::Write(err.to_string()))?;
    writer.write_all(&tracking).map_err(|err| PackError::Write(err.to_string()))?;

    // Metadata.
    let metadata = canonical_bytes(&metadata_value(input, &ordered))?;
    writer
        .start_file("metadata.json", options)
        .map_err(|err| PackError::Write(err.to_string()))?;
    writer.write_all(&metadata).map_err(|err| PackError::Write(err.to_string()))?;

    let cursor = writer.finish().map_err(|err| PackError::Write(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Serializes a value as canonical JSON bytes.
fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, PackError> {
    serde_jcs::to_vec(value).map_err(|err| PackError::Serialize(err.to_string()))
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Builds the machine-readable metadata entry.
///
/// The generation instant is deliberately absent: it is an index PDF field,
/// and every other archive entry must be byte-identical across assemblies of
/// the same inputs.
fn metadata_value(input: &AuditPackInput, ordered: &[&DocumentEntry]) -> serde_json::Value {
    let documents: Vec<serde_json::Value> = ordered
        .iter()
        .map(|entry| {
            json!({
                "id": entry.document.id,
                "document_type": entry.document.document_type.slug(),
                "reference_number": entry.document.reference_number,
                "version": entry.document.version,
                "status": entry.document.status.as_str(),
                "checksum": hash_bytes(HashAlgorithm::Sha256, &entry.bytes).value,
            })
        })
        .collect();
    json!({
        "schema_version": 1,
        "shipment": input.shipment,
        "organization": {"id": input.organization.id, "name": input.organization.name},
        "buyer": input.buyer.as_ref().map(|org| json!({"id": org.id, "name": org.name})),
        "products": input.products,
        "origins": input.origins,
        "eudr_applicable": input.eudr_applicable,
        "decision": input.decision.map(Decision::as_str),
        "documents": documents,
        "event_count": input.events.len(),
    })
}

// ============================================================================
// SECTION: Index Content
// ============================================================================

/// Renders a checklist mark for a required type.
fn checklist_mark(input: &AuditPackInput, required: &DocumentType) -> &'static str {
    let present = input
        .documents
        .iter()
        .any(|entry| entry.document.document_type == *required);
    if present { "[x]" } else { "[ ]" }
}

/// Builds the index PDF lines: header, parties, events, checklist, EUDR.
fn index_lines(input: &AuditPackInput) -> Result<Vec<String>, PackError> {
    let mut lines = Vec::new();
    lines.push("TRACEHUB SHIPMENT AUDIT PACK".to_string());
    lines.push(String::new());
    lines.push(format!("Reference:        {}", input.shipment.reference));
    lines.push(format!("Status:           {}", input.shipment.status.as_str()));
    lines.push(format!("Product type:     {}", input.shipment.product_type));
    lines.push(format!(
        "Container:        {}",
        input.shipment.container_number.as_deref().unwrap_or("-")
    ));
    lines.push(format!(
        "B/L number:       {}",
        input.shipment.bl_number.as_deref().unwrap_or("-")
    ));
    lines.push(format!(
        "Route:            {} -> {}",
        input.shipment.pol_code.as_deref().unwrap_or("-"),
        input.shipment.pod_code.as_deref().unwrap_or("-")
    ));
    let generated_at = input
        .generated_at
        .format_rfc3339()
        .map_err(|err| PackError::Time(err.to_string()))?;
    lines.push(format!("Generated at:     {generated_at}"));
    lines.push(String::new());

    lines.push("PARTIES".to_string());
    lines.push(format!("  Owner:  {}", input.organization.name));
    if let Some(buyer) = &input.buyer {
        lines.push(format!("  Buyer:  {}", buyer.name));
    }
    lines.push(String::new());

    lines.push("CONTAINER EVENTS".to_string());
    if input.events.is_empty() {
        lines.push("  (no events recorded)".to_string());
    }
    for event in &input.events {
        let time = event
            .event_time
            .format_rfc3339()
            .map_err(|err| PackError::Time(err.to_string()))?;
        lines.push(format!(
            "  {time}  {:<14} {}",
            event.event_status.as_str(),
            event.location_code.as_deref().unwrap_or("-")
        ));
    }
    lines.push(String::new());

    lines.push("DOCUMENT CHECKLIST".to_string());
    for required in &input.required_documents {
        lines.push(format!("  {} {}", checklist_mark(input, required), required.slug()));
    }
    lines.push(String::new());

    if input.eudr_applicable {
        lines.push("EUDR COMPLIANCE".to_string());
        let attested = !input.origins.is_empty()
            && input.origins.iter().all(|origin| {
                origin.deforestation_free_statement.as_deref().is_some_and(|s| !s.is_empty())
            });
        lines.push(format!(
            "  Geolocation attestations: {} origin(s); deforestation-free statement {}",
            input.origins.len(),
            if attested { "attached" } else { "MISSING" }
        ));
        if let Some(decision) = input.decision {
            lines.push(format!("  Latest decision: {}", decision.as_str()));
        }
    }

    Ok(lines)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
