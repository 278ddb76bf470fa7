// tracehub-api/src/handlers/shipments.rs
// ============================================================================
// Module: Shipment Handlers
// Description: Shipment CRUD, products, origins, and archival endpoints.
// Purpose: Expose the shipment aggregate with buyer read-only semantics.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Buyer organizations read explicitly shared shipments; every mutation
//! requires ownership. Origin attestations are rejected at write for
//! horn/hoof commodities. Archive is an admin action on delivered shipments;
//! unarchive is system-admin only.

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
use serde::Deserialize;
use tracehub_core::Origin;
use tracehub_core::Permission;
use tracehub_core::Product;
use tracehub_core::ProductId;
use tracehub_core::ResourceKind;
use tracehub_core::Shipment;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::shipment::Geolocation;
use tracehub_store_sqlite::shipments::NewOrigin;
use tracehub_store_sqlite::shipments::NewProduct;
use tracehub_store_sqlite::shipments::NewShipment;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// `POST /shipments` request body.
#[derive(Debug, Deserialize)]
pub struct CreateShipmentRequest {
    /// Optional read-only buyer organization.
    #[serde(default)]
    pub buyer_organization_id: Option<u64>,
    /// Owner-scoped unique reference.
    pub reference: String,
    /// Product type key into the compliance matrix.
    pub product_type: String,
    /// Incoterms code.
    #[serde(default)]
    pub incoterms: Option<String>,
    /// Whether the shipment is a legacy import.
    #[serde(default)]
    pub is_historical: bool,
}

/// `PUT /shipments/{id}` request body (mutable routing columns).
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    /// Container number.
    #[serde(default)]
    pub container_number: Option<String>,
    /// Vessel name.
    #[serde(default)]
    pub vessel: Option<String>,
    /// Voyage number.
    #[serde(default)]
    pub voyage: Option<String>,
    /// Port of loading UN/LOCODE.
    #[serde(default)]
    pub pol_code: Option<String>,
    /// Port of discharge UN/LOCODE.
    #[serde(default)]
    pub pod_code: Option<String>,
    /// Estimated time of departure.
    #[serde(default)]
    pub etd: Option<Timestamp>,
    /// Estimated time of arrival.
    #[serde(default)]
    pub eta: Option<Timestamp>,
    /// Incoterms code.
    #[serde(default)]
    pub incoterms: Option<String>,
}

/// `POST /shipments/{id}/products` request body.
#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    /// HS commodity code.
    pub hs_code: String,
    /// Cargo description.
    pub description: String,
    /// Net quantity in kilograms.
    #[serde(default)]
    pub quantity_net_kg: Option<f64>,
    /// Gross quantity in kilograms.
    #[serde(default)]
    pub quantity_gross_kg: Option<f64>,
}

/// `POST /shipments/{id}/origins` request body.
#[derive(Debug, Deserialize)]
pub struct AddOriginRequest {
    /// Product line attested.
    pub product_id: u64,
    /// Farm or plot identifier.
    pub farm_plot_identifier: String,
    /// Geolocation of the plot.
    pub geolocation: Geolocation,
    /// Production country.
    pub country: String,
    /// Production window start.
    #[serde(default)]
    pub production_start_date: Option<Timestamp>,
    /// Production window end.
    #[serde(default)]
    pub production_end_date: Option<Timestamp>,
    /// Deforestation-free statement text.
    #[serde(default)]
    pub deforestation_free_statement: Option<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a shipment path id.
fn shipment_id(raw: u64) -> Result<ShipmentId, ApiError> {
    ShipmentId::from_raw(raw).ok_or_else(|| ApiError::validation("invalid shipment id"))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /shipments` — creates a shipment in `draft`.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsWrite, ResourceKind::Shipment)?;
    if body.reference.trim().is_empty() {
        return Err(ApiError::validation("reference is required")
            .with_request_id(ctx.request_id.clone()));
    }
    let buyer = body
        .buyer_organization_id
        .map(|raw| {
            tracehub_core::OrgId::from_raw(raw)
                .ok_or_else(|| ApiError::validation("invalid buyer organization id"))
        })
        .transpose()?;
    let session = session_for(&state, &ctx);
    let shipment = session
        .create_shipment(
            &NewShipment {
                organization_id: ctx.tenant.org_id,
                buyer_organization_id: buyer,
                reference: body.reference,
                product_type: body.product_type,
                incoterms: body.incoterms,
                is_historical: body.is_historical,
            },
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// `GET /shipments` — lists visible shipments.
pub async fn list(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<Shipment>>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let shipments =
        session.list_shipments(200).map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(shipments))
}

/// `GET /shipments/{id}` — loads a visible shipment (owner, buyer, admin).
pub async fn get(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Shipment>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let shipment =
        session.get_shipment(shipment_id(raw)?).map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(shipment))
}

/// `PUT /shipments/{id}` — rewrites mutable routing columns.
pub async fn update(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsWrite, ResourceKind::Shipment)?;
    let id = shipment_id(raw)?;
    let session = session_for(&state, &ctx);
    let mut shipment = session
        .require_shipment_write(id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    if let Some(container) = body.container_number {
        shipment.container_number = Some(container);
    }
    if let Some(vessel) = body.vessel {
        shipment.vessel = Some(vessel);
    }
    if let Some(voyage) = body.voyage {
        shipment.voyage = Some(voyage);
    }
    if let Some(pol) = body.pol_code {
        shipment.pol_code = Some(pol);
    }
    if let Some(pod) = body.pod_code {
        shipment.pod_code = Some(pod);
    }
    if let Some(etd) = body.etd {
        shipment.etd = Some(etd);
    }
    if let Some(eta) = body.eta {
        shipment.eta = Some(eta);
    }
    if let Some(incoterms) = body.incoterms {
        shipment.incoterms = Some(incoterms);
    }
    session
        .update_shipment(&shipment, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(shipment))
}

/// `POST /shipments/{id}/products` — adds a product line.
pub async fn add_product(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsWrite, ResourceKind::Shipment)?;
    let session = session_for(&state, &ctx);
    let product = session
        .add_product(
            &NewProduct {
                shipment_id: shipment_id(raw)?,
                hs_code: body.hs_code,
                description: body.description,
                quantity_net_kg: body.quantity_net_kg,
                quantity_gross_kg: body.quantity_gross_kg,
            },
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `POST /shipments/{id}/origins` — adds an origin attestation.
pub async fn add_origin(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<AddOriginRequest>,
) -> Result<(StatusCode, Json<Origin>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsWrite, ResourceKind::Shipment)?;
    let product_id = ProductId::from_raw(body.product_id)
        .ok_or_else(|| ApiError::validation("invalid product id"))?;
    let session = session_for(&state, &ctx);
    let origin = session
        .add_origin(
            &NewOrigin {
                shipment_id: shipment_id(raw)?,
                product_id,
                farm_plot_identifier: body.farm_plot_identifier,
                geolocation: body.geolocation,
                country: body.country,
                production_start_date: body.production_start_date,
                production_end_date: body.production_end_date,
                deforestation_free_statement: body.deforestation_free_statement,
            },
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok((StatusCode::CREATED, Json(origin)))
}

/// `POST /shipments/{id}/archive` — archives a delivered shipment.
pub async fn archive(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsArchive, ResourceKind::Shipment)?;
    let session = session_for(&state, &ctx);
    session
        .archive_shipment(shipment_id(raw)?, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /shipments/{id}/unarchive` — reverses an archive (system admins).
pub async fn unarchive(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::ShipmentsArchive, ResourceKind::Shipment)?;
    let session = session_for(&state, &ctx);
    session
        .unarchive_shipment(shipment_id(raw)?, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}
