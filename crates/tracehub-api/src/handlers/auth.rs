// tracehub-api/src/handlers/auth.rs
// ============================================================================
// Module: Auth Handlers
// Description: Caller identity endpoints.
// Purpose: Expose the resolved tenant context to the frontend.
// Dependencies: axum, tracehub-core
// ============================================================================

//! ## Overview
//! Token issuance lives with the external identity provider; the engine only
//! exposes `GET /auth/me`, returning the verified caller's resolved tenant
//! context and derived permission set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::Value;
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::begin;
use crate::state::AppState;

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /auth/me` — returns the resolved tenant context.
pub async fn me(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    Ok(Json(json!({
        "user_id": ctx.tenant.user_id,
        "org_id": ctx.tenant.org_id,
        "org_role": ctx.tenant.org_role,
        "is_system_admin": ctx.tenant.is_system_admin,
        "permissions": ctx.tenant.permissions,
        "request_id": ctx.request_id,
    })))
}
