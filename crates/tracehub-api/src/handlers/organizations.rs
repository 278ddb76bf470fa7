// tracehub-api/src/handlers/organizations.rs
// ============================================================================
// Module: Organization Handlers
// Description: Organization lifecycle and settings endpoints.
// Purpose: Expose platform-admin organization management.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Organization creation and suspension are platform-admin operations;
//! settings updates are available to the organization's own admins. Deleting
//! an organization soft-suspends it.

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
use tracehub_core::OrgId;
use tracehub_core::OrgType;
use tracehub_core::Organization;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::org::Address;
use tracehub_core::org::OrgSettings;
use tracehub_store_sqlite::orgs::NewOrganization;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// `POST /organizations` request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    /// Display name.
    pub name: String,
    /// Globally unique slug.
    pub slug: String,
    /// Organization classification.
    pub org_type: OrgType,
    /// Contact email.
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<Address>,
}

/// `PUT /organizations/{id}/settings` request body.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Replacement settings payload.
    pub settings: OrgSettings,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /organizations` — creates an organization (platform admins).
pub async fn create(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::OrganizationsManage, ResourceKind::Organization)?;
    if body.slug.trim().is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::validation("name and slug are required")
            .with_request_id(ctx.request_id.clone()));
    }
    let session = session_for(&state, &ctx);
    let organization = session
        .create_organization(
            &NewOrganization {
                name: body.name,
                slug: body.slug,
                org_type: body.org_type,
                contact_email: body.contact_email,
                address: body.address,
            },
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok((StatusCode::CREATED, Json(organization)))
}

/// `GET /organizations/{id}` — loads a visible organization.
pub async fn get(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(org_id): Path<u64>,
) -> Result<Json<Organization>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let org_id = OrgId::from_raw(org_id)
        .ok_or_else(|| ApiError::validation("invalid organization id"))?;
    let session = session_for(&state, &ctx);
    let organization =
        session.get_organization(org_id).map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(organization))
}

/// `DELETE /organizations/{id}` — soft-suspends an organization.
pub async fn suspend(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(org_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::OrganizationsManage, ResourceKind::Organization)?;
    let org_id = OrgId::from_raw(org_id)
        .ok_or_else(|| ApiError::validation("invalid organization id"))?;
    let session = session_for(&state, &ctx);
    session
        .suspend_organization(org_id, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /organizations/{id}/settings` — updates organization settings.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(org_id): Path<u64>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<Organization>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let org_id = OrgId::from_raw(org_id)
        .ok_or_else(|| ApiError::validation("invalid organization id"))?;
    let session = session_for(&state, &ctx);
    let organization = session
        .update_org_settings(org_id, body.settings, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    state.settings_cache.invalidate(org_id);
    Ok(Json(organization))
}
