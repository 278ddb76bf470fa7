// tracehub-store-sqlite/tests/invitations.rs
// ============================================================================
// Module: Invitation Flow Tests
// Description: Single-use acceptance, expiry, and resend semantics.
// Purpose: Verify the transactional invitation lifecycle.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Acceptance consumes the invitation in one transaction; a second accept
//! fails `AlreadyUsed`, an expired token fails `Expired`, and resending
//! swaps the stored hash.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod helpers;

use helpers::T0;
use helpers::world;
use tracehub_core::HashAlgorithm;
use tracehub_core::INVITATION_TTL_MILLIS;
use tracehub_core::OrgRole;
use tracehub_core::hash_bytes;
use tracehub_core::interfaces::StoreError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Hashes a plaintext token the way the API layer does.
fn token_hash(plaintext: &str) -> String {
    hash_bytes(HashAlgorithm::Sha256, plaintext.as_bytes()).value
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn acceptance_is_single_use() {
    let world = world();
    let session = world.supplier_session();
    let hash = token_hash("plaintext-token-1");
    session
        .create_invitation(
            world.supplier,
            "new.colleague@vibotaj.example",
            OrgRole::Member,
            &hash,
            world.supplier_user,
            T0,
        )
        .unwrap();

    let accepted = session
        .accept_invitation(&hash, "New Colleague", "argon2-hash", T0.plus_millis(60_000))
        .unwrap();
    assert_eq!(accepted.membership.org_role, OrgRole::Member);
    assert_eq!(accepted.membership.organization_id, world.supplier);
    assert!(accepted.membership.is_primary);

    let err = session
        .accept_invitation(&hash, "New Colleague", "argon2-hash", T0.plus_millis(120_000))
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyUsed));
}

#[test]
fn expired_invitation_is_rejected() {
    let world = world();
    let session = world.supplier_session();
    let hash = token_hash("plaintext-token-2");
    session
        .create_invitation(
            world.supplier,
            "late.joiner@vibotaj.example",
            OrgRole::Viewer,
            &hash,
            world.supplier_user,
            T0,
        )
        .unwrap();

    let after_expiry = T0.plus_millis(INVITATION_TTL_MILLIS + 1);
    let err = session
        .accept_invitation(&hash, "Late Joiner", "argon2-hash", after_expiry)
        .unwrap_err();
    assert!(matches!(err, StoreError::Expired));
}

#[test]
fn resend_swaps_the_hash() {
    let world = world();
    let session = world.supplier_session();
    let old_hash = token_hash("plaintext-token-3");
    let invitation = session
        .create_invitation(
            world.supplier,
            "retry@vibotaj.example",
            OrgRole::Member,
            &old_hash,
            world.supplier_user,
            T0,
        )
        .unwrap();

    let new_hash = token_hash("plaintext-token-3-reissued");
    session.resend_invitation(invitation.id, &new_hash, T0.plus_millis(1_000)).unwrap();

    // The old token no longer resolves.
    let err = session
        .accept_invitation(&old_hash, "Retry", "argon2-hash", T0.plus_millis(2_000))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let accepted = session
        .accept_invitation(&new_hash, "Retry", "argon2-hash", T0.plus_millis(3_000))
        .unwrap();
    assert_eq!(accepted.invitation.id, invitation.id);
}

#[test]
fn revoked_invitation_cannot_be_accepted() {
    let world = world();
    let session = world.supplier_session();
    let hash = token_hash("plaintext-token-4");
    let invitation = session
        .create_invitation(
            world.supplier,
            "revoked@vibotaj.example",
            OrgRole::Member,
            &hash,
            world.supplier_user,
            T0,
        )
        .unwrap();
    session.revoke_invitation(invitation.id, T0.plus_millis(500)).unwrap();

    let err = session
        .accept_invitation(&hash, "Revoked", "argon2-hash", T0.plus_millis(1_000))
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyUsed));
}

#[test]
fn acceptance_reuses_existing_user_without_primary_flip() {
    let world = world();
    let session = world.supplier_session();
    let hash = token_hash("plaintext-token-5");
    session
        .create_invitation(
            world.supplier,
            "ops@vibotaj.example",
            OrgRole::Manager,
            &hash,
            world.supplier_user,
            T0,
        )
        .unwrap();

    let accepted = session
        .accept_invitation(&hash, "Supplier Ops", "argon2-hash", T0.plus_millis(1_000))
        .unwrap();
    assert_eq!(accepted.user.id, world.supplier_user);
}

#[test]
fn last_admin_membership_cannot_be_removed() {
    let world = world();
    let admin = world.admin_session();
    let membership = admin
        .create_membership(world.supplier_user, world.supplier, OrgRole::Admin, true, T0)
        .unwrap();
    let err = admin.remove_membership(membership.id, T0.plus_millis(1_000)).unwrap_err();
    assert!(matches!(err, StoreError::LastAdmin));
}
