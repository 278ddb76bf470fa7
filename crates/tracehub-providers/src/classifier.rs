// tracehub-providers/src/classifier.rs
// ============================================================================
// Module: Document Classifiers
// Description: HTTP classifier adapter and the keyword fallback.
// Purpose: Produce structured classifications from raw document bytes.
// Dependencies: reqwest, serde_json, tracehub-core
// ============================================================================

//! ## Overview
//! [`HttpClassifier`] forwards document bytes to the external AI/OCR
//! pipeline; its model is opaque to the engine. [`KeywordClassifier`] is the
//! fallback for deployments without the pipeline: it scans extractable text
//! for document-type keywords and reports `keyword` as the detection method
//! with conservative confidence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use tracehub_core::DetectionMethod;
use tracehub_core::DocumentType;
use tracehub_core::interfaces::ClassifiedDocument;
use tracehub_core::interfaces::ClassifierError;
use tracehub_core::interfaces::DocumentClassifier;

// ============================================================================
// SECTION: HTTP Classifier
// ============================================================================

/// HTTP adapter for the external classification pipeline.
pub struct HttpClassifier {
    /// Shared blocking client.
    client: Client,
    /// Pipeline base URL.
    base_url: String,
    /// Pipeline API key.
    api_key: String,
}

impl HttpClassifier {
    /// Builds an HTTP classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Rejected`] when the client cannot be built.
    pub fn new(base_url: &str, api_key: &str, deadline: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|err| ClassifierError::Rejected(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl DocumentClassifier for HttpClassifier {
    fn classify(&self, bytes: &[u8], mime_type: &str) -> Result<ClassifiedDocument, ClassifierError> {
        let url = format!("{}/v1/classify", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes.to_vec())
            .send()
            .map_err(|err| ClassifierError::Transient(err.to_string()))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(ClassifierError::Transient(format!("classifier returned {status}")));
        }
        if !status.is_success() {
            return Err(ClassifierError::Rejected(format!("classifier returned {status}")));
        }
        response.json().map_err(|err| ClassifierError::Transient(err.to_string()))
    }
}

// ============================================================================
// SECTION: Keyword Classifier
// ============================================================================

/// Keyword table mapping text markers to document types.
///
/// Order matters: the first matching marker wins, so the more specific
/// phrases come first.
const KEYWORD_TABLE: &[(&str, fn() -> DocumentType)] = &[
    ("BILL OF LADING", || DocumentType::BillOfLading),
    ("COMMERCIAL INVOICE", || DocumentType::CommercialInvoice),
    ("PACKING LIST", || DocumentType::PackingList),
    ("CERTIFICATE OF ORIGIN", || DocumentType::CertificateOfOrigin),
    ("PHYTOSANITARY", || DocumentType::Phytosanitary),
    ("VETERINARY HEALTH", || DocumentType::VeterinaryHealth),
    ("EU TRACES", || DocumentType::EuTraces),
    ("TRACES", || DocumentType::EuTraces),
    ("DUE DILIGENCE", || DocumentType::EudrDueDiligence),
    ("INSURANCE", || DocumentType::Insurance),
    ("QUALITY CERTIFICATE", || DocumentType::QualityCert),
];

/// Confidence reported for keyword matches.
const KEYWORD_CONFIDENCE: f64 = 0.55;

/// Keyword-heuristic classifier for pipelines-less deployments.
pub struct KeywordClassifier;

impl DocumentClassifier for KeywordClassifier {
    fn classify(&self, bytes: &[u8], _mime_type: &str) -> Result<ClassifiedDocument, ClassifierError> {
        let text = String::from_utf8_lossy(bytes).to_uppercase();
        for (marker, document_type) in KEYWORD_TABLE {
            if text.contains(marker) {
                return Ok(ClassifiedDocument {
                    document_type: document_type(),
                    reference_number: None,
                    canonical_data: None,
                    confidence: KEYWORD_CONFIDENCE,
                    detection_method: DetectionMethod::Keyword,
                });
            }
        }
        Err(ClassifierError::Rejected("no document-type marker found".to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
