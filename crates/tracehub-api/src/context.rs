// tracehub-api/src/context.rs
// ============================================================================
// Module: Request Context
// Description: Tenant context resolution and request identifiers.
// Purpose: Resolve every authenticated call to a scoped tenant context.
// Dependencies: axum, rand, tracehub-core
// ============================================================================

//! ## Overview
//! Each request is assigned a random request identifier and, when a bearer
//! token verifies, a [`TenantContext`] derived from the token claims. The
//! permission set is fully derived from `(system_role, org_role, org_type)`;
//! handlers gate actions through the single `authorize` predicate and emit a
//! security audit event on every denial.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use rand::RngCore;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::AuditRecord;
use tracehub_core::Permission;
use tracehub_core::RequestId;
use tracehub_core::ResourceKind;
use tracehub_core::TenantContext;
use tracehub_core::Timestamp;
use tracehub_core::authorize;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Resolved per-request context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Tenant context derived from verified claims.
    pub tenant: TenantContext,
    /// Request identifier tying responses to audit records.
    pub request_id: RequestId,
    /// Request receipt instant.
    pub now: Timestamp,
}

/// Generates a fresh request identifier (16 random bytes, lowercase hex).
#[must_use]
pub fn new_request_id() -> RequestId {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut rendered = String::with_capacity(32);
    for byte in bytes {
        rendered.push_str(&format!("{byte:02x}"));
    }
    RequestId::new(rendered)
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves the tenant context for a request, or fails 401.
///
/// # Errors
///
/// Returns [`ApiError`] (401) for missing, invalid, or expired tokens.
pub fn resolve(state: &AppState, headers: &HeaderMap) -> Result<RequestContext, ApiError> {
    let now = state.clock.now();
    let request_id = new_request_id();
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let claims = state
        .verifier
        .verify(header, now)
        .map_err(|err| ApiError::from(err).with_request_id(request_id.clone()))?;
    let tenant = TenantContext::resolve(
        claims.user_id,
        claims.org_id,
        claims.system_role,
        claims.org_role,
        claims.org_type,
    );
    Ok(RequestContext {
        tenant,
        request_id,
        now,
    })
}

// ============================================================================
// SECTION: Authorization Guard
// ============================================================================

/// Authorizes an action, emitting a security audit event on denial.
///
/// # Errors
///
/// Returns [`ApiError`] (403) when the permission is missing.
pub fn require(
    state: &AppState,
    ctx: &RequestContext,
    permission: Permission,
    resource: ResourceKind,
) -> Result<(), ApiError> {
    let decision = authorize(&ctx.tenant, permission, resource);
    if decision.allowed {
        return Ok(());
    }
    state.audit.emit(&AuditRecord {
        timestamp: ctx.now,
        organization_id: Some(ctx.tenant.org_id),
        user_id: Some(ctx.tenant.user_id),
        action: AuditAction::SecurityViolation,
        resource_type: resource_label(resource).to_string(),
        resource_id: None,
        details: json!({"permission": permission, "reason": decision.reason}),
        request_id: Some(ctx.request_id.clone()),
    });
    Err(ApiError::forbidden("permission denied").with_request_id(ctx.request_id.clone()))
}

/// Returns the audit label for a resource family.
const fn resource_label(resource: ResourceKind) -> &'static str {
    match resource {
        ResourceKind::Shipment => "shipment",
        ResourceKind::Document => "document",
        ResourceKind::Organization => "organization",
        ResourceKind::Invitation => "invitation",
        ResourceKind::Tracking => "tracking",
        ResourceKind::AuditPack => "audit_pack",
        ResourceKind::Notification => "notification",
    }
}
