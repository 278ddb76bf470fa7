// tracehub-api/src/handlers/audit_packs.rs
// ============================================================================
// Module: Audit Pack Handlers
// Description: Deterministic audit-pack assembly endpoint.
// Purpose: Materialize the archive for regulatory or customer review.
// Dependencies: axum, tracehub-auditpack, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Assembly is a read-only consumption of the shipment aggregate: the
//! handler gathers the records and the primary document bytes, delegates to
//! the assembler, stores the archive under the tenant's `audit-packs`
//! bucket, and returns the bytes. Identical inputs produce identical
//! archives.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use tracehub_auditpack::AuditPackInput;
use tracehub_auditpack::DocumentEntry;
use tracehub_auditpack::assemble;
use tracehub_auditpack::pack_file_name;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::ShipmentId;
use tracehub_core::eudr_applicable;
use tracehub_core::interfaces::BlobKey;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /audit-packs/{shipment_id}` — assembles and returns the archive.
pub async fn assemble_pack(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Response, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::AuditPacksRead, ResourceKind::AuditPack)?;
    let shipment_id = ShipmentId::from_raw(raw)
        .ok_or_else(|| ApiError::validation("invalid shipment id"))?;
    let session = session_for(&state, &ctx);

    let shipment =
        session.get_shipment(shipment_id).map_err(|err| map_store_err(&state, &ctx, err))?;
    let organization = session
        .get_organization(shipment.organization_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let buyer = match shipment.buyer_organization_id {
        Some(buyer_id) => session.get_organization(buyer_id).ok(),
        None => None,
    };
    let products = session
        .products_for_shipment(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let origins = session
        .origins_for_shipment(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let events = session
        .events_for_shipment(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let primaries = session
        .primary_documents(shipment_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    let blob_org = if ctx.tenant.is_system_admin {
        shipment.organization_id
    } else {
        ctx.tenant.org_id
    };
    let mut documents = Vec::with_capacity(primaries.len());
    for document in primaries {
        let Some(org) = document.organization_id else {
            continue;
        };
        let key = BlobKey {
            bucket: format!("{}-documents", state.bucket_prefix),
            org_id: org,
            resource_id: document.shipment_id.to_string(),
            filename: document.file_name.clone(),
        };
        let bytes = state
            .blob
            .get(blob_org, &key)
            .await
            .map_err(|err| ApiError::from(err).with_request_id(ctx.request_id.clone()))?;
        documents.push(DocumentEntry { document, bytes });
    }

    let is_eudr = products.iter().any(|product| eudr_applicable(&product.hs_code))
        || state
            .matrix
            .entry_for_product(&shipment.product_type)
            .is_some_and(|entry| entry.eudr_applicable);
    let input = AuditPackInput {
        required_documents: state.matrix.required_documents(&shipment.product_type),
        eudr_applicable: is_eudr,
        decision: None,
        generated_at: ctx.now,
        organization,
        buyer,
        products,
        origins,
        documents,
        events,
        shipment,
    };
    let archive =
        assemble(&input).map_err(|err| ApiError::internal(err.to_string()))?;

    // Persist the archive under the tenant's audit-packs bucket.
    let file_name = pack_file_name(&input.shipment.reference);
    let key = BlobKey {
        bucket: format!("{}-audit-packs", state.bucket_prefix),
        org_id: input.shipment.organization_id,
        resource_id: shipment_id.to_string(),
        filename: file_name.clone(),
    };
    state
        .blob
        .put(blob_org, &key, &archive)
        .await
        .map_err(|err| ApiError::from(err).with_request_id(ctx.request_id.clone()))?;

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        archive,
    );
    Ok(response.into_response())
}
