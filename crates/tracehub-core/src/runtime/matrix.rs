// tracehub-core/src/runtime/matrix.rs
// ============================================================================
// Module: TraceHub Compliance Matrix
// Description: Version-stamped policy table keyed by product type and HS prefix.
// Purpose: Define EUDR applicability and required document sets per product.
// Dependencies: crate::core::document, serde
// ============================================================================

//! ## Overview
//! The compliance matrix is an immutable, version-stamped snapshot loaded at
//! boot. Hot reload swaps a new snapshot; entries are never mutated in place.
//! The built-in v1 snapshot carries the canonical product table; horn and
//! hoof prefixes (0506, 0507) are excluded from EUDR even if the applicable
//! prefix set is later extended.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::document::DocumentType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HS prefixes for EUDR-applicable commodities.
pub const EUDR_HS_PREFIXES: &[&str] = &["1801", "0901", "1511", "4001", "1201"];

/// HS prefixes explicitly excluded from EUDR (horn and hoof).
pub const HORN_HOOF_HS_PREFIXES: &[&str] = &["0506", "0507"];

/// Regulatory production cutoff for EUDR (2020-12-31T23:59:59Z, unix millis).
pub const EUDR_PRODUCTION_CUTOFF_MILLIS: i64 = 1_609_459_199_000;

// ============================================================================
// SECTION: EUDR Applicability
// ============================================================================

/// Returns true when the HS code falls under EUDR due diligence.
///
/// Horn/hoof prefixes are excluded before the applicable set is consulted,
/// so the exclusion survives future prefix extensions.
#[must_use]
pub fn eudr_applicable(hs_code: &str) -> bool {
    let normalized = hs_code.trim();
    if HORN_HOOF_HS_PREFIXES.iter().any(|prefix| normalized.starts_with(prefix)) {
        return false;
    }
    EUDR_HS_PREFIXES.iter().any(|prefix| normalized.starts_with(prefix))
}

/// Returns true when the HS code is a horn/hoof commodity.
#[must_use]
pub fn is_horn_hoof(hs_code: &str) -> bool {
    let normalized = hs_code.trim();
    HORN_HOOF_HS_PREFIXES.iter().any(|prefix| normalized.starts_with(prefix))
}

// ============================================================================
// SECTION: Validation Expectations
// ============================================================================

/// Per-document-type validation expectation.
///
/// # Invariants
/// - An empty `expected_issuing_authorities` list imposes no authority check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationExpectation {
    /// Document type the expectation applies to.
    pub document_type: DocumentType,
    /// Accepted issuing authorities (empty = any).
    pub expected_issuing_authorities: Vec<String>,
}

// ============================================================================
// SECTION: Matrix Entry
// ============================================================================

/// One compliance matrix row.
///
/// # Invariants
/// - `product_type` is unique within a snapshot.
/// - `eudr_applicable` is false whenever any prefix is horn/hoof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Product type key (e.g. `horn_hoof`).
    pub product_type: String,
    /// HS code prefixes matching this entry.
    pub hs_prefixes: Vec<String>,
    /// Whether EUDR due diligence applies.
    pub eudr_applicable: bool,
    /// Document types required for shipment completeness.
    pub required_document_types: Vec<DocumentType>,
    /// Validation expectations per document type.
    pub validation_expectations: Vec<ValidationExpectation>,
}

// ============================================================================
// SECTION: Compliance Matrix
// ============================================================================

/// Immutable compliance matrix snapshot.
///
/// # Invariants
/// - Snapshots are never mutated after construction; reload swaps snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceMatrix {
    /// Snapshot version stamp.
    pub version: String,
    /// Matrix rows.
    pub entries: Vec<MatrixEntry>,
}

impl ComplianceMatrix {
    /// Returns the built-in v1 snapshot with the canonical product table.
    #[must_use]
    pub fn builtin() -> Self {
        let standard = vec![
            DocumentType::Phytosanitary,
            DocumentType::CertificateOfOrigin,
            DocumentType::QualityCert,
            DocumentType::BillOfLading,
            DocumentType::CommercialInvoice,
        ];
        let eudr_docs = |prefix: &str| MatrixEntry {
            product_type: String::new(),
            hs_prefixes: vec![prefix.to_string()],
            eudr_applicable: true,
            required_document_types: vec![
                DocumentType::Phytosanitary,
                DocumentType::CertificateOfOrigin,
                DocumentType::QualityCert,
                DocumentType::BillOfLading,
                DocumentType::CommercialInvoice,
                DocumentType::PackingList,
                DocumentType::EudrDueDiligence,
            ],
            validation_expectations: Vec::new(),
        };

        let mut entries = vec![
            MatrixEntry {
                product_type: "horn_hoof".to_string(),
                hs_prefixes: vec!["0506".to_string(), "0507".to_string()],
                eudr_applicable: false,
                required_document_types: vec![
                    DocumentType::EuTraces,
                    DocumentType::VeterinaryHealth,
                    DocumentType::CertificateOfOrigin,
                    DocumentType::BillOfLading,
                    DocumentType::CommercialInvoice,
                    DocumentType::PackingList,
                ],
                validation_expectations: vec![ValidationExpectation {
                    document_type: DocumentType::VeterinaryHealth,
                    expected_issuing_authorities: vec![
                        "Federal Ministry of Agriculture and Rural Development".to_string(),
                        "Nigerian Agricultural Quarantine Service".to_string(),
                        "Veterinary Council of Nigeria".to_string(),
                    ],
                }],
            },
            MatrixEntry {
                product_type: "sweet_potato_pellets".to_string(),
                hs_prefixes: vec!["0714".to_string()],
                eudr_applicable: false,
                required_document_types: standard.clone(),
                validation_expectations: Vec::new(),
            },
            MatrixEntry {
                product_type: "hibiscus".to_string(),
                hs_prefixes: vec!["0902".to_string()],
                eudr_applicable: false,
                required_document_types: standard.clone(),
                validation_expectations: Vec::new(),
            },
            MatrixEntry {
                product_type: "dried_ginger".to_string(),
                hs_prefixes: vec!["0910".to_string()],
                eudr_applicable: false,
                required_document_types: standard,
                validation_expectations: Vec::new(),
            },
        ];

        for (product_type, prefix) in [
            ("cocoa", "1801"),
            ("coffee", "0901"),
            ("palm_oil", "1511"),
            ("rubber", "4001"),
            ("soy", "1201"),
        ] {
            let mut entry = eudr_docs(prefix);
            entry.product_type = product_type.to_string();
            entries.push(entry);
        }

        Self {
            version: "v1".to_string(),
            entries,
        }
    }

    /// Looks up the entry for a product type.
    #[must_use]
    pub fn entry_for_product(&self, product_type: &str) -> Option<&MatrixEntry> {
        self.entries.iter().find(|entry| entry.product_type == product_type)
    }

    /// Looks up the entry matching an HS code prefix.
    #[must_use]
    pub fn entry_for_hs_code(&self, hs_code: &str) -> Option<&MatrixEntry> {
        let normalized = hs_code.trim();
        self.entries
            .iter()
            .find(|entry| entry.hs_prefixes.iter().any(|p| normalized.starts_with(p.as_str())))
    }

    /// Returns the required document types for a product type.
    ///
    /// Unknown product types require the baseline trade set.
    #[must_use]
    pub fn required_documents(&self, product_type: &str) -> Vec<DocumentType> {
        self.entry_for_product(product_type).map_or_else(
            || {
                vec![
                    DocumentType::BillOfLading,
                    DocumentType::CommercialInvoice,
                    DocumentType::PackingList,
                    DocumentType::CertificateOfOrigin,
                ]
            },
            |entry| entry.required_document_types.clone(),
        )
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
