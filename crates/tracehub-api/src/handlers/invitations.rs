// tracehub-api/src/handlers/invitations.rs
// ============================================================================
// Module: Invitation Handlers
// Description: Invitation issuance, acceptance, resend, and revocation.
// Purpose: Expose the single-use cross-org onboarding flow.
// Dependencies: axum, base64, rand, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Issuance generates 256 bits of randomness, returns the base64url
//! plaintext exactly once, and stores only the SHA-256 hash. Acceptance is a
//! single store transaction; a second acceptance fails `ALREADY_USED`.
//! Resending mints a fresh token and replaces the hash.

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
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracehub_core::HashAlgorithm;
use tracehub_core::Invitation;
use tracehub_core::InvitationId;
use tracehub_core::NotificationKind;
use tracehub_core::OrgRole;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::hash_bytes;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Token Minting
// ============================================================================

/// Generates a plaintext token and its stored hash.
fn mint_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_bytes(HashAlgorithm::Sha256, plaintext.as_bytes()).value;
    (plaintext, hash)
}

/// Hashes a presented plaintext token for lookup.
fn presented_hash(plaintext: &str) -> String {
    hash_bytes(HashAlgorithm::Sha256, plaintext.as_bytes()).value
}

// ============================================================================
// SECTION: Request / Response Payloads
// ============================================================================

/// `POST /invitations` request body.
#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    /// Invitee email.
    pub email: String,
    /// Role granted on acceptance.
    pub org_role: OrgRole,
}

/// `POST /invitations` response body; the URL is returned exactly once.
#[derive(Debug, Serialize)]
pub struct InvitationIssued {
    /// Invitation record (hash only).
    pub invitation: Invitation,
    /// One-time acceptance URL carrying the plaintext token.
    pub accept_url: String,
}

/// `POST /invitations/accept` request body.
#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    /// Plaintext token from the acceptance URL.
    pub token: String,
    /// Invitee full name.
    pub full_name: String,
    /// Password hash computed by the frontend flow.
    pub password_hash: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /invitations` — issues a single-use invitation.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationIssued>), ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::InvitationsManage, ResourceKind::Invitation)?;
    if !body.email.contains('@') {
        return Err(ApiError::validation("invalid email address")
            .with_request_id(ctx.request_id.clone()));
    }
    let (plaintext, hash) = mint_token();
    let session = session_for(&state, &ctx);
    let invitation = session
        .create_invitation(
            ctx.tenant.org_id,
            &body.email,
            body.org_role,
            &hash,
            ctx.tenant.user_id,
            ctx.now,
        )
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    let stored = session.insert_notification(
        ctx.tenant.org_id,
        None,
        NotificationKind::InvitationIssued,
        None,
        &format!("Invitation issued to {}", body.email),
        json!({"invitation_id": invitation.id}),
        ctx.now,
    );
    if let Ok(notification) = stored {
        let _ = tracehub_core::interfaces::Notifier::publish(state.bus.as_ref(), &notification);
    }
    let accept_url = format!("/invitations/accept?token={plaintext}");
    Ok((
        StatusCode::CREATED,
        Json(InvitationIssued {
            invitation,
            accept_url,
        }),
    ))
}

/// `POST /invitations/accept` — accepts an invitation by plaintext token.
pub async fn accept(
    State(state): State<Arc<AppState>>,
    ConnectInfo(_peer): ConnectInfo<SocketAddr>,
    Json(body): Json<AcceptInvitationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Acceptance is unauthenticated by design: the token is the credential.
    let now = state.clock.now();
    let request_id = crate::context::new_request_id();
    let session = state.store.session(
        tracehub_store_sqlite::SessionScope::worker().with_request_id(request_id.clone()),
    );
    let accepted = session
        .accept_invitation(&presented_hash(&body.token), &body.full_name, &body.password_hash, now)
        .map_err(|err| ApiError::from(err).with_request_id(request_id.clone()))?;
    Ok(Json(json!({
        "organization_id": accepted.invitation.organization_id,
        "user_id": accepted.user.id,
        "org_role": accepted.membership.org_role,
        "request_id": request_id,
    })))
}

/// `POST /invitations/{id}/resend` — mints a fresh token.
pub async fn resend(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(invitation_id): Path<u64>,
) -> Result<Json<InvitationIssued>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::InvitationsManage, ResourceKind::Invitation)?;
    let invitation_id = InvitationId::from_raw(invitation_id)
        .ok_or_else(|| ApiError::validation("invalid invitation id"))?;
    let (plaintext, hash) = mint_token();
    let session = session_for(&state, &ctx);
    let invitation = session
        .resend_invitation(invitation_id, &hash, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(InvitationIssued {
        invitation,
        accept_url: format!("/invitations/accept?token={plaintext}"),
    }))
}

/// `POST /invitations/{id}/revoke` — revokes a pending invitation.
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(invitation_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::InvitationsManage, ResourceKind::Invitation)?;
    let invitation_id = InvitationId::from_raw(invitation_id)
        .ok_or_else(|| ApiError::validation("invalid invitation id"))?;
    let session = session_for(&state, &ctx);
    session
        .revoke_invitation(invitation_id, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}
