// tracehub-core/src/core/tenant.rs
// ============================================================================
// Module: TraceHub Tenant Context
// Description: Tenant context resolution and the authorization predicate.
// Purpose: Provide a single fail-closed authz seam for every API boundary.
// Dependencies: crate::core::{identifiers, org}, serde
// ============================================================================

//! ## Overview
//! Every authenticated call resolves to a [`TenantContext`] carrying the
//! caller's organization, role, and derived permission set. Authorization is
//! a single pure predicate [`authorize`] invoked at each handler boundary;
//! decisions are deterministic for identical inputs and fail closed on
//! missing context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OrgId;
use crate::core::identifiers::UserId;
use crate::core::org::OrgRole;
use crate::core::org::OrgType;
use crate::core::org::SystemRole;

// ============================================================================
// SECTION: Permissions
// ============================================================================

/// Fixed permission enumeration derived from `(system_role, org_role, org_type)`.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read shipments within the tenant (or buyer-shared).
    ShipmentsRead,
    /// Create and mutate shipments.
    ShipmentsWrite,
    /// Read documents.
    DocumentsRead,
    /// Upload documents.
    DocumentsUpload,
    /// Approve or reject documents under manual review.
    DocumentsValidate,
    /// Override document issues with a recorded reason.
    IssuesOverride,
    /// Trigger rules engine evaluation.
    ComplianceEvaluate,
    /// Manage organizations (platform admins only).
    OrganizationsManage,
    /// Issue, resend, and revoke invitations.
    InvitationsManage,
    /// Manage tracking (resume after carrier permanent failure).
    TrackingManage,
    /// Assemble and download audit packs.
    AuditPacksRead,
    /// Read the in-app notification feed.
    NotificationsRead,
    /// Archive or unarchive shipments.
    ShipmentsArchive,
}

/// Resource families guarded by the authorization predicate.
///
/// # Invariants
/// - Variants identify the audited resource family only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Shipment rows and children.
    Shipment,
    /// Document rows and blobs.
    Document,
    /// Organization rows.
    Organization,
    /// Invitation rows.
    Invitation,
    /// Container tracking state.
    Tracking,
    /// Audit-pack archives.
    AuditPack,
    /// Notification feed.
    Notification,
}

// ============================================================================
// SECTION: Tenant Context
// ============================================================================

/// Resolved caller context scoping every query and mutation.
///
/// # Invariants
/// - `permissions` is fully derived from `(system_role, org_role, org_type)`
///   at construction; it is never mutated afterwards.
/// - `is_system_admin` is true only for platform-organization admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Calling user.
    pub user_id: UserId,
    /// Active organization.
    pub org_id: OrgId,
    /// Role within the active organization.
    pub org_role: OrgRole,
    /// Whether the caller is a platform administrator.
    pub is_system_admin: bool,
    /// Derived permission set.
    pub permissions: BTreeSet<Permission>,
}

impl TenantContext {
    /// Resolves a tenant context from the caller's roles and organization type.
    #[must_use]
    pub fn resolve(
        user_id: UserId,
        org_id: OrgId,
        system_role: SystemRole,
        org_role: OrgRole,
        org_type: OrgType,
    ) -> Self {
        let is_system_admin =
            matches!(org_type, OrgType::Platform) && matches!(system_role, SystemRole::Admin);
        let permissions = derive_permissions(system_role, org_role, org_type, is_system_admin);
        Self {
            user_id,
            org_id,
            org_role,
            is_system_admin,
            permissions,
        }
    }

    /// Returns true when the context holds the given permission.
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

// ============================================================================
// SECTION: Permission Derivation
// ============================================================================

/// Derives the fixed permission set for a caller.
///
/// The derivation is total and deterministic: identical inputs always yield
/// identical sets. Viewer-grade callers receive read-only permissions;
/// buyer-type organizations never receive write permissions on shipments
/// they can only observe.
fn derive_permissions(
    system_role: SystemRole,
    org_role: OrgRole,
    org_type: OrgType,
    is_system_admin: bool,
) -> BTreeSet<Permission> {
    let mut set = BTreeSet::new();

    set.insert(Permission::ShipmentsRead);
    set.insert(Permission::DocumentsRead);
    set.insert(Permission::NotificationsRead);
    set.insert(Permission::AuditPacksRead);

    if is_system_admin {
        set.insert(Permission::ShipmentsWrite);
        set.insert(Permission::DocumentsUpload);
        set.insert(Permission::DocumentsValidate);
        set.insert(Permission::IssuesOverride);
        set.insert(Permission::ComplianceEvaluate);
        set.insert(Permission::OrganizationsManage);
        set.insert(Permission::InvitationsManage);
        set.insert(Permission::TrackingManage);
        set.insert(Permission::ShipmentsArchive);
        return set;
    }

    let writer_role = matches!(org_role, OrgRole::Admin | OrgRole::Manager | OrgRole::Member);
    let managing_role = matches!(org_role, OrgRole::Admin | OrgRole::Manager);
    let writing_org = matches!(org_type, OrgType::Supplier | OrgType::Agent);

    if writer_role && writing_org {
        set.insert(Permission::ShipmentsWrite);
        set.insert(Permission::DocumentsUpload);
    }
    if managing_role {
        set.insert(Permission::InvitationsManage);
    }
    if managing_role && writing_org {
        set.insert(Permission::TrackingManage);
        set.insert(Permission::ShipmentsArchive);
    }
    if matches!(system_role, SystemRole::Compliance) && writer_role {
        set.insert(Permission::DocumentsValidate);
        set.insert(Permission::IssuesOverride);
        set.insert(Permission::ComplianceEvaluate);
    }
    if matches!(system_role, SystemRole::LogisticsAgent) && writer_role {
        set.insert(Permission::ComplianceEvaluate);
    }

    set
}

// ============================================================================
// SECTION: Authorization Predicate
// ============================================================================

/// Authorization decision outcome.
///
/// # Invariants
/// - `allowed` is the authoritative decision for the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthzDecision {
    /// Whether access is allowed.
    pub allowed: bool,
    /// Reason label for audit logs.
    pub reason: &'static str,
}

/// Authorizes an action against a resource family.
///
/// The predicate is pure: it consults only the supplied context. Resource
/// ownership (tenant match) is enforced separately by the store's session
/// predicate; this check gates the action itself.
#[must_use]
pub fn authorize(
    ctx: &TenantContext,
    permission: Permission,
    _resource: ResourceKind,
) -> AuthzDecision {
    if ctx.has(permission) {
        AuthzDecision {
            allowed: true,
            reason: "permission_granted",
        }
    } else {
        AuthzDecision {
            allowed: false,
            reason: "permission_missing",
        }
    }
}
