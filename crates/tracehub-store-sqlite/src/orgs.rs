// tracehub-store-sqlite/src/orgs.rs
// ============================================================================
// Module: Organization & Identity Persistence
// Description: Organizations, users, memberships, and invitation flows.
// Purpose: Enforce tenancy invariants on the identity graph.
// Dependencies: crate::store, rusqlite, tracehub-core
// ============================================================================

//! ## Overview
//! Identity operations: organization lifecycle, user rows, memberships with
//! the last-admin guard, and the single-use invitation flow. Invitation
//! tokens are handled as SHA-256 hashes only; the plaintext never reaches
//! the store. Acceptance is one transaction: re-verify, upsert the user,
//! create the membership, consume the invitation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::INVITATION_TTL_MILLIS;
use tracehub_core::Invitation;
use tracehub_core::InvitationId;
use tracehub_core::InvitationStatus;
use tracehub_core::MembershipId;
use tracehub_core::MembershipStatus;
use tracehub_core::OrgId;
use tracehub_core::OrgRole;
use tracehub_core::OrgStatus;
use tracehub_core::OrgType;
use tracehub_core::Organization;
use tracehub_core::OrganizationMembership;
use tracehub_core::SystemRole;
use tracehub_core::Timestamp;
use tracehub_core::User;
use tracehub_core::UserId;
use tracehub_core::interfaces::StoreError;
use tracehub_core::org::Address;
use tracehub_core::org::OrgSettings;

use crate::store::TenantSession;
use crate::store::from_json;
use crate::store::id_to_i64;
use crate::store::org_to_i64;
use crate::store::to_json;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// Inputs for creating an organization.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    /// Display name.
    pub name: String,
    /// Globally unique slug.
    pub slug: String,
    /// Organization classification.
    pub org_type: OrgType,
    /// Contact email.
    pub contact_email: Option<String>,
    /// Postal address.
    pub address: Option<Address>,
}

/// Inputs for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Globally unique email.
    pub email: String,
    /// Password hash (opaque).
    pub password_hash: String,
    /// Full display name.
    pub full_name: String,
    /// Platform-level role.
    pub role: SystemRole,
    /// Primary organization.
    pub organization_id: OrgId,
}

// ============================================================================
// SECTION: Organizations
// ============================================================================

impl TenantSession<'_> {
    /// Creates an organization (system administrators only).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unscoped`] for non-admin sessions,
    /// [`StoreError::Conflict`] on duplicate slug or second platform org.
    pub fn create_organization(
        &self,
        new: &NewOrganization,
        now: Timestamp,
    ) -> Result<Organization, StoreError> {
        if !self.is_system_admin() {
            return Err(StoreError::Unscoped);
        }
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;

        if new.org_type == OrgType::Platform {
            let platform_count: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM organizations
                     WHERE json_extract(record_json, '$.org_type') = 'platform'",
                    params![],
                    |row| row.get(0),
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            if platform_count > 0 {
                return Err(StoreError::Conflict(
                    "exactly one platform organization may exist".to_string(),
                ));
            }
        }

        let id = self.next_id(&tx, "organizations")?;
        let organization = Organization {
            id: OrgId::from_raw(id).ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            name: new.name.clone(),
            slug: new.slug.clone(),
            org_type: new.org_type,
            status: OrgStatus::PendingSetup,
            contact_email: new.contact_email.clone(),
            address: new.address.clone(),
            settings: OrgSettings::default(),
            created_at: now,
        };
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO organizations (id, slug, record_json) VALUES (?1, ?2, ?3)",
            params![id_to_i64(id), organization.slug, to_json(&organization)?],
        );
        match inserted {
            Ok(1) => {}
            Ok(_) => return Err(StoreError::Conflict(format!("slug taken: {}", new.slug))),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        }
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "organization",
            Some(id.to_string()),
            json!({"slug": organization.slug, "org_type": organization.org_type}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(organization)
    }

    /// Loads an organization visible to the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing or cross-tenant rows.
    pub fn get_organization(&self, org_id: OrgId) -> Result<Organization, StoreError> {
        self.require_scope()?;
        let visible = self.is_system_admin() || self.scope.org_id == Some(org_id);
        if !visible {
            return Err(StoreError::NotFound(format!("organization {org_id}")));
        }
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM organizations WHERE id = ?1",
                params![org_to_i64(org_id)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        json.map_or_else(
            || Err(StoreError::NotFound(format!("organization {org_id}"))),
            |snapshot| from_json(&snapshot),
        )
    }

    /// Activates an organization after onboarding.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is missing or the write fails.
    pub fn activate_organization(&self, org_id: OrgId, now: Timestamp) -> Result<(), StoreError> {
        self.set_org_status(org_id, OrgStatus::Active, now)
    }

    /// Soft-suspends an organization (delete semantics).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is missing or the write fails.
    pub fn suspend_organization(&self, org_id: OrgId, now: Timestamp) -> Result<(), StoreError> {
        self.set_org_status(org_id, OrgStatus::Suspended, now)
    }

    /// Rewrites an organization's lifecycle status.
    fn set_org_status(
        &self,
        org_id: OrgId,
        status: OrgStatus,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        if !self.is_system_admin() {
            return Err(StoreError::Unscoped);
        }
        let mut organization = self.get_organization(org_id)?;
        let previous = organization.status;
        organization.status = status;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        tx.execute(
            "UPDATE organizations SET record_json = ?2 WHERE id = ?1",
            params![org_to_i64(org_id), to_json(&organization)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "organization",
            Some(org_id.to_string()),
            json!({"previous_status": previous, "new_status": status}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Updates the settings of the session's own organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn update_org_settings(
        &self,
        org_id: OrgId,
        settings: OrgSettings,
        now: Timestamp,
    ) -> Result<Organization, StoreError> {
        self.check_write_org(org_id)?;
        let mut organization = self.get_organization(org_id)?;
        organization.settings = settings;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        tx.execute(
            "UPDATE organizations SET record_json = ?2 WHERE id = ?1",
            params![org_to_i64(org_id), to_json(&organization)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "organization",
            Some(org_id.to_string()),
            json!({"field": "settings"}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(organization)
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

impl TenantSession<'_> {
    /// Creates a user owned by its primary organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on duplicate email and
    /// [`StoreError::TenantMismatch`] on cross-tenant writes.
    pub fn create_user(&self, new: &NewUser, now: Timestamp) -> Result<User, StoreError> {
        self.check_write_org(new.organization_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "users")?;
        let user = User {
            id: UserId::from_raw(id).ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            full_name: new.full_name.clone(),
            role: new.role,
            organization_id: new.organization_id,
            is_active: true,
            deleted_at: None,
            deleted_by: None,
        };
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO users (id, email, organization_id, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id_to_i64(id),
                user.email,
                org_to_i64(new.organization_id),
                to_json(&user)?
            ],
        );
        match inserted {
            Ok(1) => {}
            Ok(_) => return Err(StoreError::Conflict(format!("email taken: {}", new.email))),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        }
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Create,
            "user",
            Some(id.to_string()),
            json!({"email": user.email}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(user)
    }

    /// Finds a user by email within the session scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or unscoped sessions.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM users
                 WHERE email = ?1 AND (organization_id = ?2 OR ?3)",
                params![email, self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        json.map(|snapshot| from_json(&snapshot)).transpose()
    }
}

// ============================================================================
// SECTION: Memberships
// ============================================================================

impl TenantSession<'_> {
    /// Creates a membership row for a user in an organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the pair already exists.
    pub fn create_membership(
        &self,
        user_id: UserId,
        organization_id: OrgId,
        org_role: OrgRole,
        is_primary: bool,
        now: Timestamp,
    ) -> Result<OrganizationMembership, StoreError> {
        self.check_write_org(organization_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let membership = self.insert_membership_tx(
            &tx,
            user_id,
            organization_id,
            org_role,
            is_primary,
            now,
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(membership)
    }

    /// Inserts a membership inside an existing transaction.
    fn insert_membership_tx(
        &self,
        tx: &rusqlite::Transaction<'_>,
        user_id: UserId,
        organization_id: OrgId,
        org_role: OrgRole,
        is_primary: bool,
        now: Timestamp,
    ) -> Result<OrganizationMembership, StoreError> {
        let id = self.next_id(tx, "memberships")?;
        let membership = OrganizationMembership {
            id: MembershipId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            user_id,
            organization_id,
            org_role,
            is_primary,
            status: MembershipStatus::Active,
        };
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO memberships (id, user_id, organization_id, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id_to_i64(id),
                id_to_i64(user_id.get()),
                org_to_i64(organization_id),
                to_json(&membership)?
            ],
        );
        match inserted {
            Ok(1) => {}
            Ok(_) => {
                return Err(StoreError::Conflict(format!(
                    "membership exists: user {user_id} in organization {organization_id}"
                )));
            }
            Err(err) => return Err(StoreError::Io(err.to_string())),
        }
        self.append_audit_tx(
            tx,
            now,
            AuditAction::Create,
            "membership",
            Some(id.to_string()),
            json!({"user_id": user_id, "organization_id": organization_id, "org_role": org_role}),
        )?;
        Ok(membership)
    }

    /// Lists memberships for a user visible to the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or unscoped sessions.
    pub fn memberships_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrganizationMembership>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM memberships
                 WHERE user_id = ?1 AND (organization_id = ?2 OR ?3)
                 ORDER BY id",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![id_to_i64(user_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get::<_, String>(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut memberships = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            memberships.push(from_json(&json)?);
        }
        Ok(memberships)
    }

    /// Removes a membership, guarding the last active admin.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LastAdmin`] when removal would leave the
    /// organization without an active admin member.
    pub fn remove_membership(
        &self,
        membership_id: MembershipId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM memberships
                 WHERE id = ?1 AND (organization_id = ?2 OR ?3)",
                params![id_to_i64(membership_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let membership: OrganizationMembership = json
            .map_or_else(
                || Err(StoreError::NotFound(format!("membership {membership_id}"))),
                |snapshot| from_json(&snapshot),
            )?;
        if membership.org_role == OrgRole::Admin {
            let admin_count: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM memberships
                     WHERE organization_id = ?1
                       AND json_extract(record_json, '$.org_role') = 'admin'
                       AND json_extract(record_json, '$.status') = 'active'",
                    params![org_to_i64(membership.organization_id)],
                    |row| row.get(0),
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            if admin_count <= 1 {
                return Err(StoreError::LastAdmin);
            }
        }
        tx.execute(
            "DELETE FROM memberships WHERE id = ?1",
            params![id_to_i64(membership_id.get())],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Delete,
            "membership",
            Some(membership_id.to_string()),
            json!({"organization_id": membership.organization_id, "user_id": membership.user_id}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Invitations
// ============================================================================

/// Outcome of a successful invitation acceptance.
#[derive(Debug, Clone)]
pub struct AcceptedInvitation {
    /// Invitation after consumption.
    pub invitation: Invitation,
    /// User created or reused.
    pub user: User,
    /// Membership granted.
    pub membership: OrganizationMembership,
}

impl TenantSession<'_> {
    /// Issues an invitation storing only the token hash.
    ///
    /// The caller generates the plaintext token and hashes it; the store
    /// never sees the plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on cross-tenant writes or I/O failure.
    pub fn create_invitation(
        &self,
        organization_id: OrgId,
        email: &str,
        org_role: OrgRole,
        token_hash: &str,
        created_by: UserId,
        now: Timestamp,
    ) -> Result<Invitation, StoreError> {
        self.check_write_org(organization_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "invitations")?;
        let invitation = Invitation {
            id: InvitationId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            organization_id,
            email: email.to_string(),
            org_role,
            token_hash: token_hash.to_string(),
            status: InvitationStatus::Pending,
            expires_at: now.plus_millis(INVITATION_TTL_MILLIS),
            created_by,
            created_at: now,
        };
        tx.execute(
            "INSERT INTO invitations (id, organization_id, token_hash, status, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id_to_i64(id),
                org_to_i64(organization_id),
                invitation.token_hash,
                "pending",
                to_json(&invitation)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Invite,
            "invitation",
            Some(id.to_string()),
            json!({"organization_id": organization_id, "email": email, "org_role": org_role}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(invitation)
    }

    /// Accepts an invitation by token hash in one transaction.
    ///
    /// Re-verifies the invitation (pending, not expired), creates or reuses
    /// the user, grants the membership, and consumes the invitation. A
    /// second acceptance fails [`StoreError::AlreadyUsed`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`], [`StoreError::Expired`], or
    /// [`StoreError::AlreadyUsed`] per the verification outcome.
    pub fn accept_invitation(
        &self,
        token_hash: &str,
        full_name: &str,
        password_hash: &str,
        now: Timestamp,
    ) -> Result<AcceptedInvitation, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;

        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM invitations WHERE token_hash = ?1",
                params![token_hash],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut invitation: Invitation = json.map_or_else(
            || Err(StoreError::NotFound("invitation".to_string())),
            |snapshot| from_json(&snapshot),
        )?;

        match invitation.status {
            InvitationStatus::Pending => {}
            InvitationStatus::Accepted | InvitationStatus::Revoked => {
                return Err(StoreError::AlreadyUsed);
            }
            InvitationStatus::Expired => return Err(StoreError::Expired),
        }
        if invitation.is_expired_at(now) {
            invitation.status = InvitationStatus::Expired;
            tx.execute(
                "UPDATE invitations SET status = 'expired', record_json = ?2 WHERE id = ?1",
                params![id_to_i64(invitation.id.get()), to_json(&invitation)?],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
            return Err(StoreError::Expired);
        }

        let existing: Option<String> = tx
            .query_row(
                "SELECT record_json FROM users WHERE email = ?1",
                params![invitation.email],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let user: User = if let Some(snapshot) = existing {
            from_json(&snapshot)?
        } else {
            let id = self.next_id(&tx, "users")?;
            let user = User {
                id: UserId::from_raw(id)
                    .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
                email: invitation.email.clone(),
                password_hash: password_hash.to_string(),
                full_name: full_name.to_string(),
                role: SystemRole::Viewer,
                organization_id: invitation.organization_id,
                is_active: true,
                deleted_at: None,
                deleted_by: None,
            };
            tx.execute(
                "INSERT INTO users (id, email, organization_id, record_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id_to_i64(id),
                    user.email,
                    org_to_i64(invitation.organization_id),
                    to_json(&user)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            user
        };

        let has_primary: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM memberships
                 WHERE user_id = ?1 AND json_extract(record_json, '$.is_primary') = 1",
                params![id_to_i64(user.id.get())],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let membership = self.insert_membership_tx(
            &tx,
            user.id,
            invitation.organization_id,
            invitation.org_role,
            has_primary == 0,
            now,
        )?;

        invitation.status = InvitationStatus::Accepted;
        tx.execute(
            "UPDATE invitations SET status = 'accepted', record_json = ?2 WHERE id = ?1",
            params![id_to_i64(invitation.id.get()), to_json(&invitation)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::AcceptInvite,
            "invitation",
            Some(invitation.id.to_string()),
            json!({"organization_id": invitation.organization_id, "user_id": user.id}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(AcceptedInvitation {
            invitation,
            user,
            membership,
        })
    }

    /// Replaces an invitation's token hash and resets its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing or consumed invitations.
    pub fn resend_invitation(
        &self,
        invitation_id: InvitationId,
        new_token_hash: &str,
        now: Timestamp,
    ) -> Result<Invitation, StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM invitations
                 WHERE id = ?1 AND (organization_id = ?2 OR ?3)",
                params![id_to_i64(invitation_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut invitation: Invitation = json.map_or_else(
            || Err(StoreError::NotFound(format!("invitation {invitation_id}"))),
            |snapshot| from_json(&snapshot),
        )?;
        if invitation.status == InvitationStatus::Accepted {
            return Err(StoreError::AlreadyUsed);
        }
        invitation.token_hash = new_token_hash.to_string();
        invitation.status = InvitationStatus::Pending;
        invitation.expires_at = now.plus_millis(INVITATION_TTL_MILLIS);
        tx.execute(
            "UPDATE invitations SET token_hash = ?2, status = 'pending', record_json = ?3
             WHERE id = ?1",
            params![
                id_to_i64(invitation_id.get()),
                invitation.token_hash,
                to_json(&invitation)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Invite,
            "invitation",
            Some(invitation_id.to_string()),
            json!({"resend": true}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(invitation)
    }

    /// Revokes a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing invitations and
    /// [`StoreError::AlreadyUsed`] for consumed ones.
    pub fn revoke_invitation(
        &self,
        invitation_id: InvitationId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM invitations
                 WHERE id = ?1 AND (organization_id = ?2 OR ?3)",
                params![id_to_i64(invitation_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut invitation: Invitation = json.map_or_else(
            || Err(StoreError::NotFound(format!("invitation {invitation_id}"))),
            |snapshot| from_json(&snapshot),
        )?;
        if invitation.status == InvitationStatus::Accepted {
            return Err(StoreError::AlreadyUsed);
        }
        invitation.status = InvitationStatus::Revoked;
        tx.execute(
            "UPDATE invitations SET status = 'revoked', record_json = ?2 WHERE id = ?1",
            params![id_to_i64(invitation_id.get()), to_json(&invitation)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        self.append_audit_tx(
            &tx,
            now,
            AuditAction::Update,
            "invitation",
            Some(invitation_id.to_string()),
            json!({"new_status": "revoked"}),
        )?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))
    }
}
