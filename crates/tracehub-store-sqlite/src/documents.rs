// tracehub-store-sqlite/src/documents.rs
// ============================================================================
// Module: Document Persistence
// Description: Versioned documents, transitions, issues, and expiry.
// Purpose: Drive the document lifecycle inside audited transactions.
// Dependencies: crate::store, rusqlite, tracehub-core
// ============================================================================

//! ## Overview
//! Document uploads create versioned rows: a replacement with the same
//! `(shipment, type, reference)` flips the old primary off and links the new
//! row via `supersedes_id`. Every lifecycle transition goes through the
//! static table and writes its audit record in the same transaction. The
//! reference registry detects duplicate uploads by reference number.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::CanonicalData;
use tracehub_core::ComplianceResult;
use tracehub_core::Document;
use tracehub_core::DocumentEvent;
use tracehub_core::DocumentFlow;
use tracehub_core::DocumentId;
use tracehub_core::DocumentIssue;
use tracehub_core::DocumentStatus;
use tracehub_core::DocumentType;
use tracehub_core::EvaluationInput;
use tracehub_core::EvaluationReport;
use tracehub_core::IssueId;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::UserId;
use tracehub_core::interfaces::StoreError;

use crate::store::TenantSession;
use crate::store::from_json;
use crate::store::id_to_i64;
use crate::store::org_to_i64;
use crate::store::to_json;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// Inputs for recording an uploaded document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Document classification.
    pub document_type: DocumentType,
    /// Original file name.
    pub file_name: String,
    /// Blob key the bytes were stored under.
    pub file_path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Lowercase hex SHA-256 of the file bytes.
    pub checksum: String,
    /// Reference number when known.
    pub reference_number: Option<String>,
    /// Issue date.
    pub issue_date: Option<Timestamp>,
    /// Expiry date.
    pub expiry_date: Option<Timestamp>,
    /// Issuing authority.
    pub issuing_authority: Option<String>,
    /// Typed structured extraction.
    pub canonical_data: Option<CanonicalData>,
    /// Classifier confidence.
    pub classification_confidence: Option<f64>,
}

// ============================================================================
// SECTION: Upload & Versioning
// ============================================================================

impl TenantSession<'_> {
    /// Records an uploaded document, creating a new version when a primary
    /// row with the same `(shipment, type, reference)` already exists.
    ///
    /// Horn/hoof shipments reject EUDR due diligence documents at write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EudrExcluded`] for EUDR artefacts on excluded
    /// commodities, and [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn insert_document(&self, new: &NewDocument, now: Timestamp) -> Result<Document, StoreError> {
        let shipment = self.require_shipment_write(new.shipment_id)?;
        if new.document_type == DocumentType::EudrDueDiligence
            && shipment.product_type == "horn_hoof"
        {
            return Err(StoreError::EudrExcluded(
                "EUDR due diligence documents are not accepted for horn/hoof shipments"
                    .to_string(),
            ));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;

        // A replacement carries the same (shipment, type, reference).
        let predecessor: Option<String> = match new.reference_number.as_deref() {
            Some(reference) => tx
                .query_row(
                    "SELECT record_json FROM documents
                     WHERE shipment_id = ?1 AND document_type = ?2
                       AND reference_number = ?3 AND is_primary = 1",
                    params![
                        id_to_i64(new.shipment_id.get()),
                        type_key(&new.document_type),
                        reference
                    ],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| StoreError::Io(err.to_string()))?,
            None => None,
        };
        let predecessor: Option<Document> =
            predecessor.map(|snapshot| from_json(&snapshot)).transpose()?;

        let id = self.next_id(&tx, "documents")?;
        let document = Document {
            id: DocumentId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            shipment_id: new.shipment_id,
            organization_id: Some(shipment.organization_id),
            document_type: new.document_type.clone(),
            status: DocumentStatus::Uploaded,
            file_name: new.file_name.clone(),
            file_path: new.file_path.clone(),
            file_size: new.file_size,
            mime_type: new.mime_type.clone(),
            checksum: Some(new.checksum.clone()),
            reference_number: new.reference_number.clone(),
            issue_date: new.issue_date,
            expiry_date: new.expiry_date,
            issuing_authority: new.issuing_authority.clone(),
            canonical_data: new.canonical_data.clone(),
            version: predecessor.as_ref().map_or(1, |prev| prev.version + 1),
            is_primary: true,
            supersedes_id: predecessor.as_ref().map(|prev| prev.id),
            classification_confidence: new.classification_confidence,
            parsed_at: new.canonical_data.as_ref().map(|_| now),
            last_validated_at: None,
            created_at: now,
        };

        if let Some(previous) = &predecessor {
            let mut demoted = previous.clone();
            demoted.is_primary = false;
            tx.execute(
                "UPDATE documents SET is_primary = 0, record_json = ?2 WHERE id = ?1",
                params![id_to_i64(previous.id.get()), to_json(&demoted)?],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        } else if let Some(reference) = new.reference_number.as_deref() {
            tx.execute(
                "INSERT OR IGNORE INTO reference_registry
                     (organization_id, shipment_id, reference_number, document_type, first_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    org_to_i64(shipment.organization_id),
                    id_to_i64(new.shipment_id.get()),
                    reference,
                    type_key(&new.document_type),
                    now.unix_millis()
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        }

        tx.execute(
            "INSERT INTO documents
                 (id, shipment_id, organization_id, document_type, reference_number,
                  status, is_primary, expiry_date, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
            params![
                id_to_i64(id),
                id_to_i64(new.shipment_id.get()),
                org_to_i64(shipment.organization_id),
                type_key(&new.document_type),
                document.reference_number,
                document.status.as_str(),
                document.expiry_date.map(Timestamp::unix_millis),
                to_json(&document)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;

        let detail = predecessor.as_ref().map_or_else(
            || json!({"document_type": type_key(&new.document_type)}),
            |prev| {
                json!({
                    "document_type": type_key(&new.document_type),
                    "supersedes_id": prev.id,
                    "version": prev.version + 1,
                })
            },
        );
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "document",
            Some(id.to_string()),
            detail,
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(document)
    }

    /// Loads a document visible to the session.
    ///
    /// Legacy rows with no owning organization are visible to system
    /// administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing or cross-tenant rows.
    pub fn get_document(&self, document_id: DocumentId) -> Result<Document, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT d.record_json FROM documents d
                 LEFT JOIN shipments s ON s.id = d.shipment_id
                 WHERE d.id = ?1
                   AND (d.organization_id = ?2 OR s.buyer_organization_id = ?2 OR ?3)",
                params![id_to_i64(document_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        json.map_or_else(
            || Err(StoreError::NotFound(format!("document {document_id}"))),
            |snapshot| from_json(&snapshot),
        )
    }

    /// Lists the primary document versions of a visible shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn primary_documents(&self, shipment_id: ShipmentId) -> Result<Vec<Document>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM documents
                 WHERE shipment_id = ?1 AND is_primary = 1
                 ORDER BY id",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut documents = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            documents.push(from_json(&json)?);
        }
        Ok(documents)
    }

    /// Lists every version of every document on a visible shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn documents_for_shipment(
        &self,
        shipment_id: ShipmentId,
    ) -> Result<Vec<Document>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT record_json FROM documents WHERE shipment_id = ?1 ORDER BY id")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut documents = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            documents.push(from_json(&json)?);
        }
        Ok(documents)
    }
}

// ============================================================================
// SECTION: Transitions
// ============================================================================

impl TenantSession<'_> {
    /// Applies a lifecycle event to a document inside one audited transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] for illegal pairs and
    /// [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn transition_document(
        &self,
        document_id: DocumentId,
        event: DocumentEvent,
        reason: Option<&str>,
        now: Timestamp,
    ) -> Result<Document, StoreError> {
        let mut document = self.get_document(document_id)?;
        self.require_shipment_write(document.shipment_id)?;
        if event == DocumentEvent::Rejected && reason.is_none() {
            return Err(StoreError::Invalid("rejection requires a reason".to_string()));
        }
        let next = DocumentFlow::apply(document.status, event)
            .map_err(|err| StoreError::InvalidTransition(err.to_string()))?;
        let previous = document.status;
        document.status = next;
        if event == DocumentEvent::Approved {
            document.last_validated_at = Some(now);
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        tx.execute(
            "UPDATE documents SET status = ?2, record_json = ?3 WHERE id = ?1",
            params![id_to_i64(document_id.get()), next.as_str(), to_json(&document)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Transition,
            "document",
            Some(document_id.to_string()),
            json!({
                "previous_status": previous.as_str(),
                "new_status": next.as_str(),
                "event": event.as_str(),
                "reason": reason,
            }),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(document)
    }

    /// Expires every non-terminal document past its expiry date.
    ///
    /// Returns the expired documents. The sweep is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query or write failure.
    pub fn expire_documents(&self, now: Timestamp) -> Result<Vec<Document>, StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let snapshots = {
            let mut stmt = tx
                .prepare(
                    "SELECT record_json FROM documents
                     WHERE expiry_date IS NOT NULL AND expiry_date < ?1
                       AND status NOT IN ('archived', 'rejected', 'expired')
                       AND (organization_id = ?2 OR ?3)",
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            let rows = stmt
                .query_map(
                    params![now.unix_millis(), self.org_param(), self.is_system_admin()],
                    |row| row.get::<_, String>(0),
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            let mut snapshots = Vec::new();
            for row in rows {
                snapshots.push(row.map_err(|err| StoreError::Io(err.to_string()))?);
            }
            snapshots
        };
        let mut expired = Vec::new();
        for snapshot in snapshots {
            let mut document: Document = from_json(&snapshot)?;
            let previous = document.status;
            document.status = DocumentFlow::apply(previous, DocumentEvent::Expired)
                .map_err(|err| StoreError::InvalidTransition(err.to_string()))?;
            tx.execute(
                "UPDATE documents SET status = 'expired', record_json = ?2 WHERE id = ?1",
                params![id_to_i64(document.id.get()), to_json(&document)?],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            self.append_audit_tx(
                &tx,
                now,
                AuditAction::Transition,
                "document",
                Some(document.id.to_string()),
                json!({
                    "previous_status": previous.as_str(),
                    "new_status": "expired",
                    "event": "expired",
                }),
            )?;
            expired.push(document);
        }
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(expired)
    }
}

// ============================================================================
// SECTION: Issues & Results
// ============================================================================

impl TenantSession<'_> {
    /// Lists issues for a visible shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn issues_for_shipment(
        &self,
        shipment_id: ShipmentId,
    ) -> Result<Vec<DocumentIssue>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT record_json FROM document_issues WHERE shipment_id = ?1 ORDER BY id")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut issues = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            issues.push(from_json(&json)?);
        }
        Ok(issues)
    }

    /// Persists an evaluation report: replaces issues (re-applying overrides
    /// by `(rule_id, field)`), appends compliance results, and transitions
    /// the evaluated document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure.
    pub fn record_evaluation(
        &self,
        document_id: DocumentId,
        report: &EvaluationReport,
        now: Timestamp,
    ) -> Result<Vec<DocumentIssue>, StoreError> {
        let document = self.get_document(document_id)?;
        let shipment = self.require_shipment_write(document.shipment_id)?;
        let prior = self.issues_for_shipment(document.shipment_id)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        tx.execute(
            "DELETE FROM document_issues WHERE shipment_id = ?1",
            params![id_to_i64(document.shipment_id.get())],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;

        let mut issues = Vec::new();
        for result in report.results.iter().filter(|result| !result.passed) {
            let id = self.next_id(&tx, "document_issues")?;
            let prior_override = prior.iter().find(|issue| {
                issue.is_overridden
                    && issue.rule_id == result.rule_id
                    && issue.field == result.field
            });
            let issue = DocumentIssue {
                id: IssueId::from_raw(id)
                    .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
                document_id,
                shipment_id: document.shipment_id,
                rule_id: result.rule_id.clone(),
                rule_name: result.rule_name.clone(),
                severity: result.severity,
                message: result.message.clone(),
                field: result.field.clone(),
                expected_value: result.expected.clone(),
                actual_value: result.actual.clone(),
                is_overridden: prior_override.is_some(),
                overridden_by: prior_override.and_then(|issue| issue.overridden_by),
                override_reason: prior_override.and_then(|issue| issue.override_reason.clone()),
            };
            tx.execute(
                "INSERT INTO document_issues
                     (id, document_id, shipment_id, organization_id, rule_id, record_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id_to_i64(id),
                    id_to_i64(document_id.get()),
                    id_to_i64(document.shipment_id.get()),
                    org_to_i64(shipment.organization_id),
                    issue.rule_id,
                    to_json(&issue)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            issues.push(issue);
        }

        for result in &report.results {
            let id = self.next_id(&tx, "compliance_results")?;
            let record = ComplianceResult {
                document_id,
                rule_id: result.rule_id.clone(),
                passed: result.passed,
                severity: result.severity,
                message: result.message.clone(),
                checked_at: now,
            };
            tx.execute(
                "INSERT INTO compliance_results (id, document_id, organization_id, record_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id_to_i64(id),
                    id_to_i64(document_id.get()),
                    org_to_i64(shipment.organization_id),
                    to_json(&record)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        }

        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Evaluate,
            "document",
            Some(document_id.to_string()),
            json!({
                "decision": report.decision.as_str(),
                "active_failures": report.active_failures,
            }),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(issues)
    }

    /// Records an override on an issue with a justification.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for invisible issues.
    pub fn override_issue(
        &self,
        issue_id: IssueId,
        overridden_by: UserId,
        reason: &str,
        now: Timestamp,
    ) -> Result<DocumentIssue, StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM document_issues
                 WHERE id = ?1 AND (organization_id = ?2 OR ?3)",
                params![id_to_i64(issue_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut issue: DocumentIssue = json.map_or_else(
            || Err(StoreError::NotFound(format!("issue {issue_id}"))),
            |snapshot| from_json(&snapshot),
        )?;
        issue.is_overridden = true;
        issue.overridden_by = Some(overridden_by);
        issue.override_reason = Some(reason.to_string());
        tx.execute(
            "UPDATE document_issues SET record_json = ?2 WHERE id = ?1",
            params![id_to_i64(issue_id.get()), to_json(&issue)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Override,
            "document_issue",
            Some(issue_id.to_string()),
            json!({"rule_id": issue.rule_id, "reason": reason}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(issue)
    }
}

// ============================================================================
// SECTION: Evaluation Input Assembly
// ============================================================================

impl TenantSession<'_> {
    /// Assembles the complete rules engine input for a shipment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn evaluation_input(&self, shipment_id: ShipmentId) -> Result<EvaluationInput, StoreError> {
        let shipment = self.get_shipment(shipment_id)?;
        Ok(EvaluationInput {
            products: self.products_for_shipment(shipment_id)?,
            origins: self.origins_for_shipment(shipment_id)?,
            documents: self.primary_documents(shipment_id)?,
            prior_issues: self.issues_for_shipment(shipment_id)?,
            shipment,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a document type as its stable column key.
pub(crate) fn type_key(document_type: &DocumentType) -> String {
    document_type.slug()
}
