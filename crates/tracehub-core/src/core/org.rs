// tracehub-core/src/core/org.rs
// ============================================================================
// Module: TraceHub Organizations & Identity
// Description: Organization, user, membership, and invitation records.
// Purpose: Model the tenant boundary and cross-org onboarding flows.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Organizations are the tenant isolation boundary. Users belong to a primary
//! organization and may hold memberships in others; invitations carry hashed
//! single-use tokens for cross-org onboarding. Structured payloads (`address`,
//! `settings`) are typed with an explicit schema version; unrecognized input
//! fields are preserved in a sidecar value but never interpreted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::InvitationId;
use crate::core::identifiers::MembershipId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::UserId;
use crate::core::time::MILLIS_PER_DAY;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Invitation validity window in milliseconds (7 days).
pub const INVITATION_TTL_MILLIS: i64 = 7 * MILLIS_PER_DAY;

// ============================================================================
// SECTION: Organization
// ============================================================================

/// Organization classification.
///
/// # Invariants
/// - Exactly one organization of type `platform` exists per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    /// The single platform operator organization.
    Platform,
    /// Buying-side organization (read-side tenant on shipments).
    Buyer,
    /// Supplying-side organization (shipment owner).
    Supplier,
    /// Logistics or customs agent organization.
    Agent,
}

/// Organization lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgStatus {
    /// Active organization.
    Active,
    /// Soft-suspended organization (delete semantics).
    Suspended,
    /// Created but onboarding incomplete.
    PendingSetup,
}

/// Postal address payload with explicit schema version.
///
/// # Invariants
/// - `schema_version` identifies the interpreted field set; `sidecar` holds
///   unrecognized input fields verbatim and is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Payload schema version.
    pub schema_version: u32,
    /// Street line.
    pub street: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
    /// Unrecognized fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

/// Organization settings payload with explicit schema version.
///
/// # Invariants
/// - `schema_version` identifies the interpreted field set; `sidecar` holds
///   unrecognized input fields verbatim and is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSettings {
    /// Payload schema version.
    pub schema_version: u32,
    /// Quiescence period before delivered shipments auto-archive, in days.
    pub archive_quiescence_days: u32,
    /// Unrecognized fields preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<Value>,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            schema_version: 1,
            archive_quiescence_days: 14,
            sidecar: None,
        }
    }
}

/// Organization record.
///
/// # Invariants
/// - `slug` is globally unique.
/// - Deleting an organization suspends it; rows are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrgId,
    /// Display name.
    pub name: String,
    /// Globally unique slug.
    pub slug: String,
    /// Organization classification.
    pub org_type: OrgType,
    /// Lifecycle status.
    pub status: OrgStatus,
    /// Contact email address.
    pub contact_email: Option<String>,
    /// Postal address.
    pub address: Option<Address>,
    /// Organization settings.
    pub settings: OrgSettings,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: User
// ============================================================================

/// Platform-level user role.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Platform administrator.
    Admin,
    /// Compliance reviewer.
    Compliance,
    /// Logistics agent.
    LogisticsAgent,
    /// Buyer-side user.
    Buyer,
    /// Supplier-side user.
    Supplier,
    /// Read-only viewer.
    Viewer,
}

/// User record.
///
/// # Invariants
/// - `email` is globally unique.
/// - `organization_id` names the primary organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Globally unique email address.
    pub email: String,
    /// Password hash (opaque to the engine).
    pub password_hash: String,
    /// Full display name.
    pub full_name: String,
    /// Platform-level role.
    pub role: SystemRole,
    /// Primary organization.
    pub organization_id: OrgId,
    /// Whether the account is active.
    pub is_active: bool,
    /// Soft-delete timestamp when deleted.
    pub deleted_at: Option<Timestamp>,
    /// Actor that performed the soft delete.
    pub deleted_by: Option<UserId>,
}

// ============================================================================
// SECTION: Membership
// ============================================================================

/// Role held within a single organization.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Organization administrator.
    Admin,
    /// Manager with mutation rights.
    Manager,
    /// Regular member.
    Member,
    /// Read-only viewer.
    Viewer,
}

/// Membership lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Active membership.
    Active,
    /// Suspended membership.
    Suspended,
}

/// Organization membership record.
///
/// # Invariants
/// - Unique on `(user_id, organization_id)`.
/// - Each user has exactly one membership with `is_primary = true`.
/// - An organization always retains at least one active admin member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    /// Membership identifier.
    pub id: MembershipId,
    /// Member user.
    pub user_id: UserId,
    /// Organization joined.
    pub organization_id: OrgId,
    /// Role within the organization.
    pub org_role: OrgRole,
    /// Whether this is the user's primary organization.
    pub is_primary: bool,
    /// Membership status.
    pub status: MembershipStatus,
}

// ============================================================================
// SECTION: Invitation
// ============================================================================

/// Invitation lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Issued and awaiting acceptance.
    Pending,
    /// Accepted; single use consumed.
    Accepted,
    /// Past its expiry window.
    Expired,
    /// Revoked by an administrator.
    Revoked,
}

/// Invitation record.
///
/// # Invariants
/// - Only the SHA-256 hash of the token is stored; the plaintext is returned
///   once at issuance and never persisted.
/// - Acceptance is single-use; a second acceptance fails `AlreadyUsed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Invitation identifier.
    pub id: InvitationId,
    /// Inviting organization.
    pub organization_id: OrgId,
    /// Invitee email address.
    pub email: String,
    /// Role granted on acceptance.
    pub org_role: OrgRole,
    /// Lowercase hex SHA-256 of the plaintext token.
    pub token_hash: String,
    /// Lifecycle status.
    pub status: InvitationStatus,
    /// Expiry timestamp (issuance + 7 days).
    pub expires_at: Timestamp,
    /// Issuing user.
    pub created_by: UserId,
    /// Issuance timestamp.
    pub created_at: Timestamp,
}

impl Invitation {
    /// Returns true when the invitation is past its expiry window at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}
