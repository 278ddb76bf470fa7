// tracehub-api/src/handlers/compliance.rs
// ============================================================================
// Module: Compliance Handlers
// Description: Rules engine evaluation, issues, and overrides.
// Purpose: Expose the APPROVE / HOLD / REJECT decision path.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Evaluation runs under the shipment's advisory lock: assemble the input,
//! run every applicable rule in deterministic order, persist the report
//! (re-applying prior overrides), advance validated documents to their
//! compliance status, link the set when complete, and re-derive the shipment
//! status. Overrides record a justification and survive re-evaluation by
//! `(rule_id, field)`.

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
use serde::Deserialize;
use serde_json::json;
use tracehub_core::Decision;
use tracehub_core::DocumentEvent;
use tracehub_core::DocumentIssue;
use tracehub_core::DocumentStatus;
use tracehub_core::DocumentType;
use tracehub_core::EvaluationReport;
use tracehub_core::IssueId;
use tracehub_core::NotificationKind;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::RulesEngine;
use tracehub_core::ShipmentId;
use tracehub_core::interfaces::Notifier;
use tracehub_core::interfaces::StoreError;
use tracehub_store_sqlite::TenantSession;

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

/// `POST /compliance/issues/{id}/override` request body.
#[derive(Debug, Deserialize)]
pub struct OverrideIssueRequest {
    /// Override justification (required).
    pub reason: String,
}

// ============================================================================
// SECTION: Evaluation Flow
// ============================================================================

/// Runs one evaluation for a shipment under its advisory lock.
///
/// # Errors
///
/// Returns [`StoreError`] when persistence fails.
pub(crate) fn evaluate_shipment(
    state: &AppState,
    ctx: &RequestContext,
    session: &TenantSession<'_>,
    shipment_id: ShipmentId,
) -> Result<EvaluationReport, StoreError> {
    state.store.with_shipment_lock(shipment_id, || {
        let input = session.evaluation_input(shipment_id)?;
        let engine = RulesEngine::new(&state.matrix);
        let report = engine.evaluate(&input, ctx.now);

        // The report attaches to the primary Bill of Lading when present,
        // otherwise to the first primary document.
        let target = input
            .documents
            .iter()
            .find(|doc| doc.document_type == DocumentType::BillOfLading)
            .or_else(|| input.documents.first());
        if let Some(target) = target {
            session.record_evaluation(target.id, &report, ctx.now)?;
        }

        // Validated documents advance to their compliance status.
        let event = if report.decision == Decision::Reject {
            DocumentEvent::ComplianceFailed
        } else {
            DocumentEvent::CompliancePassed
        };
        for document in &input.documents {
            if document.status == DocumentStatus::Validated {
                session.transition_document(document.id, event, None, ctx.now)?;
            }
        }

        // Link the set once every required type is compliant.
        let required = state.matrix.required_documents(&input.shipment.product_type);
        let primaries = session.primary_documents(shipment_id)?;
        let complete = !required.is_empty()
            && required.iter().all(|doc_type| {
                primaries
                    .iter()
                    .any(|doc| doc.document_type == *doc_type && doc.status.is_compliant())
            });
        if complete {
            for document in &primaries {
                if matches!(
                    document.status,
                    DocumentStatus::ComplianceOk | DocumentStatus::ComplianceFailed
                ) {
                    session.transition_document(
                        document.id,
                        DocumentEvent::Linked,
                        None,
                        ctx.now,
                    )?;
                }
            }
        }

        session.recompute_shipment_status(shipment_id, &state.matrix, ctx.now)?;
        Ok(report)
    })
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /compliance/evaluate/{shipment_id}` — runs the rules engine.
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<EvaluationReport>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ComplianceEvaluate, ResourceKind::Shipment)?;
    let shipment_id = ShipmentId::from_raw(raw)
        .ok_or_else(|| ApiError::validation("invalid shipment id"))?;
    let session = session_for(&state, &ctx);
    session
        .require_shipment_write(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let report = evaluate_shipment(&state, &ctx, &session, shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    let shipment =
        session.get_shipment(shipment_id).map_err(|err| map_store_err(&state, &ctx, err))?;
    let stored = session.insert_notification(
        shipment.organization_id,
        None,
        NotificationKind::ComplianceDecision,
        Some(shipment_id),
        &format!("Compliance decision for {}: {}", shipment.reference, report.decision.as_str()),
        json!({"decision": report.decision.as_str(), "active_failures": report.active_failures}),
        ctx.now,
    );
    if let Ok(notification) = stored {
        let _ = state.bus.publish(&notification);
    }
    Ok(Json(report))
}

/// `GET /compliance/{shipment_id}/issues` — lists persisted issues.
pub async fn issues(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Vec<DocumentIssue>>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let shipment_id = ShipmentId::from_raw(raw)
        .ok_or_else(|| ApiError::validation("invalid shipment id"))?;
    let session = session_for(&state, &ctx);
    let issues = session
        .issues_for_shipment(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(issues))
}

/// `POST /compliance/issues/{id}/override` — overrides an issue with reason.
pub async fn override_issue(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<OverrideIssueRequest>,
) -> Result<Json<DocumentIssue>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::IssuesOverride, ResourceKind::Document)?;
    if body.reason.trim().is_empty() {
        return Err(ApiError::validation("override reason is required")
            .with_request_id(ctx.request_id.clone()));
    }
    let issue_id =
        IssueId::from_raw(raw).ok_or_else(|| ApiError::validation("invalid issue id"))?;
    let session = session_for(&state, &ctx);
    let issue = session
        .override_issue(issue_id, ctx.tenant.user_id, &body.reason, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(issue))
}
