// tracehub-api/src/handlers/documents.rs
// ============================================================================
// Module: Document Handlers
// Description: Upload, classification, validation, and download endpoints.
// Purpose: Drive the document lifecycle from the HTTP surface.
// Dependencies: axum, base64, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Upload persists the file bytes under the tenant's blob prefix, records the
//! checksummed document row (creating a new version when the reference
//! matches an existing primary), classifies the bytes through the configured
//! pipeline with the keyword fallback, and — for a Bill of Lading — runs the
//! authoritative enrichment under the shipment's advisory lock before
//! recomputing the shipment status. Validation and rejection are reviewer
//! actions; downloads return a tenant-scoped signed URL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use serde_json::json;
use tracehub_core::CanonicalData;
use tracehub_core::Document;
use tracehub_core::DocumentEvent;
use tracehub_core::DocumentId;
use tracehub_core::DocumentType;
use tracehub_core::HashAlgorithm;
use tracehub_core::NotificationKind;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::enrich_from_bol;
use tracehub_core::hash_bytes;
use tracehub_core::interfaces::BlobKey;
use tracehub_core::interfaces::Notifier;
use tracehub_core::interfaces::SignedUrl;
use tracehub_store_sqlite::documents::NewDocument;

use crate::context::RequestContext;
use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// `POST /documents` request body.
#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    /// Parent shipment.
    pub shipment_id: u64,
    /// Declared document type (overridden by classification when absent).
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Base64-encoded file bytes.
    pub content_base64: String,
    /// Reference number when known.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Issue date.
    #[serde(default)]
    pub issue_date: Option<Timestamp>,
    /// Expiry date.
    #[serde(default)]
    pub expiry_date: Option<Timestamp>,
    /// Issuing authority.
    #[serde(default)]
    pub issuing_authority: Option<String>,
}

/// `POST /documents/{id}/reject` request body.
#[derive(Debug, Deserialize)]
pub struct RejectDocumentRequest {
    /// Rejection reason (required).
    pub reason: String,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a document path id.
fn document_id(raw: u64) -> Result<DocumentId, ApiError> {
    DocumentId::from_raw(raw).ok_or_else(|| ApiError::validation("invalid document id"))
}

/// Publishes a stored notification through the bus, absorbing failures.
fn notify(
    state: &AppState,
    ctx: &RequestContext,
    session: &tracehub_store_sqlite::TenantSession<'_>,
    org: tracehub_core::OrgId,
    kind: NotificationKind,
    shipment_id: ShipmentId,
    message: &str,
) {
    let stored = session.insert_notification(
        org,
        None,
        kind,
        Some(shipment_id),
        message,
        json!({}),
        ctx.now,
    );
    if let Ok(notification) = stored {
        let _ = state.bus.publish(&notification);
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /documents` — uploads a document into its shipment.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::DocumentsUpload, ResourceKind::Document)?;
    let shipment_id = ShipmentId::from_raw(body.shipment_id)
        .ok_or_else(|| ApiError::validation("invalid shipment id"))?;
    let bytes = BASE64_STANDARD
        .decode(body.content_base64.as_bytes())
        .map_err(|_| ApiError::validation("content_base64 is not valid base64"))?;
    if bytes.is_empty() {
        return Err(ApiError::validation("empty upload").with_request_id(ctx.request_id.clone()));
    }

    let session = session_for(&state, &ctx);
    let shipment = session
        .require_shipment_write(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    // Classification is best-effort: the declared type wins, then the
    // pipeline, then the upload is rejected as unclassifiable. The driver
    // blocks, so it runs off the async worker.
    let classified = {
        let classifier = Arc::clone(&state.classifier);
        let mime_type = body.mime_type.clone();
        let bytes = bytes.clone();
        tokio::task::spawn_blocking(move || classifier.classify(&bytes, &mime_type).ok())
            .await
            .ok()
            .flatten()
    };
    let document_type = body
        .document_type
        .or_else(|| classified.as_ref().map(|c| c.document_type.clone()))
        .ok_or_else(|| {
            ApiError::validation("document type not declared and not classifiable")
                .with_request_id(ctx.request_id.clone())
        })?;
    let canonical_data = classified.as_ref().and_then(|c| c.canonical_data.clone());
    let confidence = classified.as_ref().map(|c| c.confidence);
    let reference_number = body
        .reference_number
        .or_else(|| classified.as_ref().and_then(|c| c.reference_number.clone()));

    let checksum = hash_bytes(HashAlgorithm::Sha256, &bytes).value;
    let key = BlobKey {
        bucket: format!("{}-documents", state.bucket_prefix),
        org_id: shipment.organization_id,
        resource_id: shipment_id.to_string(),
        filename: body.file_name.clone(),
    };
    // System admins write on behalf of the owning tenant.
    let blob_org = if ctx.tenant.is_system_admin {
        shipment.organization_id
    } else {
        ctx.tenant.org_id
    };
    state
        .blob
        .put(blob_org, &key, &bytes)
        .await
        .map_err(|err| ApiError::from(err).with_request_id(ctx.request_id.clone()))?;

    let document = session
        .insert_document(
            &NewDocument {
                shipment_id,
                document_type,
                file_name: body.file_name,
                file_path: key.render(),
                file_size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
                mime_type: body.mime_type,
                checksum,
                reference_number,
                issue_date: body.issue_date,
                expiry_date: body.expiry_date,
                issuing_authority: body.issuing_authority,
                canonical_data: canonical_data.clone(),
                classification_confidence: confidence,
            },
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    // A parsed Bill of Lading is authoritative for the shipment columns.
    state
        .store
        .with_shipment_lock(shipment_id, || {
            if let Some(CanonicalData::Bol(parsed)) = &canonical_data {
                let mut shipment = session.get_shipment(shipment_id)?;
                let outcome = enrich_from_bol(&mut shipment, parsed);
                if outcome.changed() {
                    session.update_shipment(&shipment, ctx.now)?;
                }
            }
            session.recompute_shipment_status(shipment_id, &state.matrix, ctx.now)?;
            Ok(())
        })
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    if document.supersedes_id.is_some() {
        notify(
            &state,
            &ctx,
            &session,
            shipment.organization_id,
            NotificationKind::DocumentSuperseded,
            shipment_id,
            &format!("Document replaced by version {}", document.version),
        );
    }
    notify(
        &state,
        &ctx,
        &session,
        shipment.organization_id,
        NotificationKind::DocumentUploaded,
        shipment_id,
        &format!("Document {} uploaded", document.file_name),
    );

    Ok((StatusCode::CREATED, Json(document)))
}

/// `GET /documents/{id}` — loads a visible document.
pub async fn get(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Document>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let document =
        session.get_document(document_id(raw)?).map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(document))
}

/// `GET /shipments/{id}/documents` — lists every version on a shipment.
pub async fn list_for_shipment(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let shipment_id = ShipmentId::from_raw(raw)
        .ok_or_else(|| ApiError::validation("invalid shipment id"))?;
    let session = session_for(&state, &ctx);
    let documents = session
        .documents_for_shipment(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(documents))
}

/// Checks the structured fields a type must carry before approval.
fn required_fields_check(
    state: &AppState,
    product_type: &str,
    document: &Document,
) -> Result<(), String> {
    if matches!(
        document.document_type,
        DocumentType::BillOfLading | DocumentType::CommercialInvoice
    ) && document.reference_number.as_deref().is_none_or(str::is_empty)
    {
        return Err("reference number required for this document type".to_string());
    }
    let expectation = state
        .matrix
        .entry_for_product(product_type)
        .and_then(|entry| {
            entry
                .validation_expectations
                .iter()
                .find(|expectation| expectation.document_type == document.document_type)
        });
    if let Some(expectation) = expectation {
        if expectation.expected_issuing_authorities.is_empty() {
            return Ok(());
        }
        let authority = document.issuing_authority.as_deref().unwrap_or("");
        let accepted = expectation
            .expected_issuing_authorities
            .iter()
            .any(|expected| expected.eq_ignore_ascii_case(authority.trim()));
        if !accepted {
            return Err(format!(
                "issuing authority '{authority}' is not accepted for this document type"
            ));
        }
    }
    Ok(())
}

/// `POST /documents/{id}/validate` — reviewer approval.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Document>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::DocumentsValidate, ResourceKind::Document)?;
    let session = session_for(&state, &ctx);
    let id = document_id(raw)?;
    let pending = session.get_document(id).map_err(|err| map_store_err(&state, &ctx, err))?;
    let shipment = session
        .get_shipment(pending.shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    if let Err(reason) = required_fields_check(&state, &shipment.product_type, &pending) {
        return Err(ApiError::new(
            axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION",
            reason,
        )
        .with_request_id(ctx.request_id.clone()));
    }
    let document = session
        .transition_document(id, DocumentEvent::Approved, None, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    if let Some(org) = document.organization_id {
        notify(
            &state,
            &ctx,
            &session,
            org,
            NotificationKind::DocumentValidated,
            document.shipment_id,
            &format!("Document {} validated", document.file_name),
        );
    }
    Ok(Json(document))
}

/// `POST /documents/{id}/reject` — reviewer rejection with reason.
pub async fn reject(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<RejectDocumentRequest>,
) -> Result<Json<Document>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::DocumentsValidate, ResourceKind::Document)?;
    if body.reason.trim().is_empty() {
        return Err(ApiError::validation("rejection reason is required")
            .with_request_id(ctx.request_id.clone()));
    }
    let session = session_for(&state, &ctx);
    let document = session
        .transition_document(
            document_id(raw)?,
            DocumentEvent::Rejected,
            Some(&body.reason),
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    if let Some(org) = document.organization_id {
        notify(
            &state,
            &ctx,
            &session,
            org,
            NotificationKind::DocumentRejected,
            document.shipment_id,
            &format!("Document {} rejected", document.file_name),
        );
    }
    Ok(Json(document))
}

/// `GET /documents/{id}/download` — returns a tenant-scoped signed URL.
pub async fn download(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<SignedUrl>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let document =
        session.get_document(document_id(raw)?).map_err(|err| map_store_err(&state, &ctx, err))?;
    let org = document
        .organization_id
        .ok_or_else(|| ApiError::not_found("document has no owning organization"))?;
    let key = BlobKey {
        bucket: format!("{}-documents", state.bucket_prefix),
        org_id: org,
        resource_id: document.shipment_id.to_string(),
        filename: document.file_name.clone(),
    };
    let blob_org = if ctx.tenant.is_system_admin { org } else { ctx.tenant.org_id };
    let signed = state
        .blob
        .signed_url(blob_org, &key, ctx.now)
        .await
        .map_err(|err| ApiError::from(err).with_request_id(ctx.request_id.clone()))?;
    Ok(Json(signed))
}
