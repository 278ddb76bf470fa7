// tracehub-core/src/core/document.rs
// ============================================================================
// Module: TraceHub Documents
// Description: Document, content, issue, and compliance result records.
// Purpose: Model versioned trade documents and their structured extractions.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Documents are versioned: replacing a document creates a new row pointing at
//! the previous one via `supersedes_id`, and only one row per
//! `(shipment, document_type)` carries `is_primary = true`. Structured
//! extraction payloads are typed variants with an explicit schema version;
//! unrecognized extractor fields are preserved in a sidecar value but never
//! interpreted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ContentId;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::IssueId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::ShipmentId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Document Type
// ============================================================================

/// Trade document classification.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `pack_order` defines the fixed audit-pack sequence; `Other` sorts last
///   alphabetically by slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Bill of Lading.
    BillOfLading,
    /// Commercial Invoice.
    CommercialInvoice,
    /// Packing List.
    PackingList,
    /// Certificate of Origin.
    CertificateOfOrigin,
    /// Phytosanitary Certificate.
    Phytosanitary,
    /// Veterinary Health Certificate.
    VeterinaryHealth,
    /// Sanitary Certificate.
    Sanitary,
    /// EU TRACES certificate.
    EuTraces,
    /// Quality Certificate.
    QualityCert,
    /// Insurance Certificate.
    Insurance,
    /// EUDR Due Diligence Statement.
    EudrDueDiligence,
    /// Any other document type, keyed by slug.
    Other(String),
}

impl DocumentType {
    /// Returns the stable slug used in blob keys and audit-pack entries.
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::BillOfLading => "bill-of-lading".to_string(),
            Self::CommercialInvoice => "commercial-invoice".to_string(),
            Self::PackingList => "packing-list".to_string(),
            Self::CertificateOfOrigin => "certificate-of-origin".to_string(),
            Self::Phytosanitary => "phytosanitary-certificate".to_string(),
            Self::VeterinaryHealth => "veterinary-health-certificate".to_string(),
            Self::Sanitary => "sanitary-certificate".to_string(),
            Self::EuTraces => "eu-traces".to_string(),
            Self::QualityCert => "quality-certificate".to_string(),
            Self::Insurance => "insurance-certificate".to_string(),
            Self::EudrDueDiligence => "eudr-due-diligence".to_string(),
            Self::Other(slug) => slug.clone(),
        }
    }

    /// Returns the fixed audit-pack ordering rank (lower sorts first).
    ///
    /// `Other` documents share the final rank and order alphabetically by
    /// slug among themselves.
    #[must_use]
    pub const fn pack_order(&self) -> u8 {
        match self {
            Self::BillOfLading => 0,
            Self::CommercialInvoice => 1,
            Self::PackingList => 2,
            Self::CertificateOfOrigin => 3,
            Self::Phytosanitary => 4,
            Self::VeterinaryHealth => 5,
            Self::Sanitary => 6,
            Self::EuTraces => 7,
            Self::Insurance => 8,
            Self::EudrDueDiligence => 9,
            Self::QualityCert => 10,
            Self::Other(_) => 11,
        }
    }
}

// ============================================================================
// SECTION: Document Status
// ============================================================================

/// Document lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Transitions are legal only per the lifecycle table in
///   [`crate::runtime::document_flow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Created; file bytes not yet persisted.
    Draft,
    /// File bytes persisted and checksummed.
    Uploaded,
    /// Queued for manual review.
    PendingValidation,
    /// Approved by a human reviewer.
    Validated,
    /// Rules engine reported no ERROR-severity failures.
    ComplianceOk,
    /// Rules engine reported at least one ERROR failure.
    ComplianceFailed,
    /// Counted toward a complete shipment document set.
    Linked,
    /// Archived with its shipment.
    Archived,
    /// Rejected by a reviewer.
    Rejected,
    /// Past its expiry date.
    Expired,
}

impl DocumentStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Uploaded => "uploaded",
            Self::PendingValidation => "pending_validation",
            Self::Validated => "validated",
            Self::ComplianceOk => "compliance_ok",
            Self::ComplianceFailed => "compliance_failed",
            Self::Linked => "linked",
            Self::Archived => "archived",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    /// Returns true when no further transitions are legal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived | Self::Rejected | Self::Expired)
    }

    /// Returns true when the document counts toward shipment completeness.
    #[must_use]
    pub const fn is_compliant(self) -> bool {
        matches!(self, Self::ComplianceOk | Self::Linked | Self::Archived)
    }
}

// ============================================================================
// SECTION: Parsed Bill of Lading
// ============================================================================

/// Cargo line extracted from a Bill of Lading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BolCargoItem {
    /// Cargo description line.
    pub description: String,
    /// Package count when stated.
    pub packages: Option<u32>,
    /// Gross weight in kilograms when stated.
    pub gross_weight_kg: Option<f64>,
}

/// Structured Bill of Lading extraction.
///
/// # Invariants
/// - `confidence` is within [0, 1].
/// - The parsed BoL is authoritative for container and B/L numbers during
///   enrichment and cross-document comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedBol {
    /// Payload schema version.
    pub schema_version: u32,
    /// Shipper name.
    pub shipper: Option<String>,
    /// Consignee name.
    pub consignee: Option<String>,
    /// Bill of Lading number.
    pub bol_number: Option<String>,
    /// Container numbers on the BoL.
    pub containers: Vec<String>,
    /// Cargo description lines.
    pub cargo_items: Vec<BolCargoItem>,
    /// Port of loading as written (UN/LOCODE preferred).
    pub port_of_loading: Option<String>,
    /// Port of discharge as written (UN/LOCODE preferred).
    pub port_of_discharge: Option<String>,
    /// Shipped-on-board date.
    pub shipped_on_board: Option<Timestamp>,
    /// Vessel name.
    pub vessel: Option<String>,
    /// Voyage number.
    pub voyage: Option<String>,
    /// Extractor confidence within [0, 1].
    pub confidence: f64,
    /// Unrecognized extractor fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

// ============================================================================
// SECTION: Canonical Data
// ============================================================================

/// Key fields extracted from a Commercial Invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Payload schema version.
    pub schema_version: u32,
    /// Invoice number.
    pub invoice_number: Option<String>,
    /// Container number referenced on the invoice.
    pub container_number: Option<String>,
    /// Net weight in kilograms.
    pub net_weight_kg: Option<f64>,
    /// Invoice currency code.
    pub currency: Option<String>,
    /// Total invoice amount.
    pub total_amount: Option<f64>,
    /// Unrecognized extractor fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

/// Key fields extracted from a Packing List.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingListFields {
    /// Payload schema version.
    pub schema_version: u32,
    /// Container number referenced on the packing list.
    pub container_number: Option<String>,
    /// Net weight in kilograms.
    pub net_weight_kg: Option<f64>,
    /// Gross weight in kilograms.
    pub gross_weight_kg: Option<f64>,
    /// Package count.
    pub packages: Option<u32>,
    /// Unrecognized extractor fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

/// Key fields extracted from a certificate-style document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    /// Payload schema version.
    pub schema_version: u32,
    /// Certificate reference number.
    pub certificate_number: Option<String>,
    /// Issuing authority name.
    pub issuing_authority: Option<String>,
    /// Country of issue.
    pub country_of_issue: Option<String>,
    /// Unrecognized extractor fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

/// Typed structured extraction stored on a document.
///
/// # Invariants
/// - The variant matches the document type it was extracted from.
/// - Unknown extractor fields live in each variant's sidecar and are never
///   interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalData {
    /// Bill of Lading extraction.
    Bol(ParsedBol),
    /// Commercial Invoice extraction.
    Invoice(InvoiceFields),
    /// Packing List extraction.
    PackingList(PackingListFields),
    /// Certificate extraction.
    Certificate(CertificateFields),
    /// Unstructured extraction kept verbatim.
    Opaque {
        /// Payload schema version.
        schema_version: u32,
        /// Raw extractor output.
        raw: Value,
    },
}

impl CanonicalData {
    /// Returns the parsed BoL when this payload is a Bill of Lading.
    #[must_use]
    pub const fn as_bol(&self) -> Option<&ParsedBol> {
        match self {
            Self::Bol(parsed) => Some(parsed),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// Document record.
///
/// # Invariants
/// - Only one row per `(shipment_id, document_type)` has `is_primary = true`.
/// - `supersedes_id` points at the replaced version; `version` increases by 1.
/// - `organization_id` matches the parent shipment's owner, except legacy
///   rows where it is absent (system-admin visibility only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Owning organization; `None` only on legacy v1-migration rows.
    pub organization_id: Option<OrgId>,
    /// Document classification.
    pub document_type: DocumentType,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Original upload file name.
    pub file_name: String,
    /// Blob key (`{bucket}/{org_id}/{shipment_id}/{file_name}`).
    pub file_path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME type of the upload.
    pub mime_type: String,
    /// Lowercase hex SHA-256 of the file bytes.
    pub checksum: Option<String>,
    /// Document reference number (e.g. B/L number).
    pub reference_number: Option<String>,
    /// Issue date.
    pub issue_date: Option<Timestamp>,
    /// Expiry date; non-terminal documents expire past this instant.
    pub expiry_date: Option<Timestamp>,
    /// Issuing authority.
    pub issuing_authority: Option<String>,
    /// Typed structured extraction.
    pub canonical_data: Option<CanonicalData>,
    /// Version number starting at 1.
    pub version: u32,
    /// Whether this row is the primary version for its type.
    pub is_primary: bool,
    /// Previous version superseded by this row.
    pub supersedes_id: Option<DocumentId>,
    /// Classifier confidence within [0, 1].
    pub classification_confidence: Option<f64>,
    /// When structured extraction completed.
    pub parsed_at: Option<Timestamp>,
    /// When validation last ran.
    pub last_validated_at: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Document Content
// ============================================================================

/// Detection method for a logical sub-document.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// AI classifier detection.
    Ai,
    /// Keyword-heuristic detection.
    Keyword,
    /// Manual operator assignment.
    Manual,
}

/// Logical sub-document inside a multi-document PDF.
///
/// # Invariants
/// - `page_start <= page_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// Content identifier.
    pub id: ContentId,
    /// Parent document.
    pub document_id: DocumentId,
    /// Detected document classification.
    pub document_type: DocumentType,
    /// Lifecycle status of the logical sub-document.
    pub status: DocumentStatus,
    /// First page (1-based, inclusive).
    pub page_start: u32,
    /// Last page (1-based, inclusive).
    pub page_end: u32,
    /// Detected reference number.
    pub reference_number: Option<String>,
    /// Typed detected fields.
    pub detected_fields: Option<CanonicalData>,
    /// Detection confidence within [0, 1].
    pub confidence: f64,
    /// How the sub-document was detected.
    pub detection_method: DetectionMethod,
}

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Rule failure severity.
///
/// # Invariants
/// - Ordering is `Info < Warning < Error` for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational finding; never blocks a decision.
    Info,
    /// Warning finding; holds a decision until overridden.
    Warning,
    /// Error finding; rejects a decision until overridden.
    Error,
}

impl Severity {
    /// Returns a stable label for the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

// ============================================================================
// SECTION: Document Issue
// ============================================================================

/// Persistent rule failure attached to a document.
///
/// # Invariants
/// - Overridden issues keep their payload and remain auditable.
/// - Overrides are re-applied across re-evaluations by `(rule_id, field)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssue {
    /// Issue identifier.
    pub id: IssueId,
    /// Document the issue is attached to.
    pub document_id: DocumentId,
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Rule identifier (e.g. `BOL-001`).
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// Failure severity.
    pub severity: Severity,
    /// Failure message.
    pub message: String,
    /// Field the failure refers to.
    pub field: Option<String>,
    /// Expected value when applicable.
    pub expected_value: Option<String>,
    /// Actual value when applicable.
    pub actual_value: Option<String>,
    /// Whether the issue has been overridden.
    pub is_overridden: bool,
    /// User that recorded the override.
    pub overridden_by: Option<UserId>,
    /// Override justification.
    pub override_reason: Option<String>,
}

// ============================================================================
// SECTION: Compliance Result
// ============================================================================

/// Point-in-time rule evaluation outcome for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// Document evaluated.
    pub document_id: DocumentId,
    /// Rule identifier.
    pub rule_id: String,
    /// Whether the rule passed.
    pub passed: bool,
    /// Failure severity (meaningful when `passed` is false).
    pub severity: Severity,
    /// Outcome message.
    pub message: String,
    /// Evaluation timestamp.
    pub checked_at: Timestamp,
}
