// tracehub-api/src/handlers/mod.rs
// ============================================================================
// Module: API Handlers
// Description: Request handlers grouped by resource family.
// Purpose: Share request plumbing across the handler modules.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Every handler follows the same shape: resolve the tenant context, admit
//! the caller through the rate limiter, authorize the action, run the store
//! operation, and map failures into the error envelope. Cross-tenant and
//! integrity failures additionally emit a security audit event.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit_packs;
pub mod auth;
pub mod compliance;
pub mod documents;
pub mod invitations;
pub mod notifications;
pub mod organizations;
pub mod shipments;
pub mod tracking;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use axum::http::HeaderMap;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::AuditRecord;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::TenantSession;

use crate::context::RequestContext;
use crate::context::resolve;
use crate::error::ApiError;
use crate::ratelimit::RateDecision;
use crate::state::AppState;

// ============================================================================
// SECTION: Shared Plumbing
// ============================================================================

/// Resolves the context and admits the caller through the rate limiter.
///
/// # Errors
///
/// Returns [`ApiError`] for authentication failures (401) and rate limiting
/// (429).
pub(crate) fn begin(
    state: &AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> Result<RequestContext, ApiError> {
    let ctx = resolve(state, headers)?;
    let key = format!("{}|{}", peer.ip(), ctx.tenant.user_id);
    if let RateDecision::Limited { retry_after_secs } = state.limiter.check(&key, ctx.now) {
        let mut error = ApiError::new(
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "rate limit exceeded",
        )
        .with_request_id(ctx.request_id.clone());
        error.details = json!({"retry_after_secs": retry_after_secs});
        return Err(error);
    }
    Ok(ctx)
}

/// Opens a tenant session bound to the resolved context.
pub(crate) fn session_for<'a>(state: &'a AppState, ctx: &RequestContext) -> TenantSession<'a> {
    let scope = if ctx.tenant.is_system_admin {
        SessionScope::system_admin(ctx.tenant.user_id)
    } else {
        SessionScope::tenant(ctx.tenant.org_id, ctx.tenant.user_id)
    };
    state.store.session(scope.with_request_id(ctx.request_id.clone()))
}

/// Maps a store failure into the envelope, emitting security audit events
/// for cross-tenant and integrity violations.
pub(crate) fn map_store_err(
    state: &AppState,
    ctx: &RequestContext,
    error: tracehub_core::interfaces::StoreError,
) -> ApiError {
    let mapped = ApiError::from(error).with_request_id(ctx.request_id.clone());
    if mapped.is_security_event() {
        state.audit.emit(&AuditRecord {
            timestamp: ctx.now,
            organization_id: Some(ctx.tenant.org_id),
            user_id: Some(ctx.tenant.user_id),
            action: AuditAction::SecurityViolation,
            resource_type: "store".to_string(),
            resource_id: None,
            details: json!({"code": mapped.code, "message": mapped.message}),
            request_id: Some(ctx.request_id.clone()),
        });
    }
    mapped
}
