// tracehub-api/src/auth.rs
// ============================================================================
// Module: Bearer Authentication
// Description: Verification of identity-provider bearer tokens.
// Purpose: Fail-closed token verification with constant-time comparison.
// Dependencies: base64, serde_json, sha2, subtle, tracehub-core
// ============================================================================

//! ## Overview
//! The external identity provider issues bearer tokens of the form
//! `base64url(claims_json) "." base64url(sha256(key || claims_json))`. The
//! engine verifies the tag against its shared verifier key and checks the
//! expiry; claims carry the caller's user, organization, and roles. Tag
//! comparison is constant-time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracehub_core::OrgId;
use tracehub_core::OrgRole;
use tracehub_core::OrgType;
use tracehub_core::SystemRole;
use tracehub_core::Timestamp;
use tracehub_core::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted token length in bytes.
const MAX_TOKEN_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Claims asserted by the identity provider.
///
/// # Invariants
/// - Claims are trusted only after tag verification succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Calling user.
    pub user_id: UserId,
    /// Active organization.
    pub org_id: OrgId,
    /// Role within the active organization.
    pub org_role: OrgRole,
    /// Platform-level role.
    pub system_role: SystemRole,
    /// Organization classification.
    pub org_type: OrgType,
    /// Expiry instant (unix milliseconds).
    pub expires_at: Timestamp,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors (all surface as 401).
#[derive(Debug, Error)]
pub enum AuthError {
    /// Header missing or not a bearer token.
    #[error("missing bearer token")]
    Missing,
    /// Token malformed or oversized.
    #[error("malformed bearer token")]
    Malformed,
    /// Verification tag mismatch.
    #[error("bearer token verification failed")]
    BadSignature,
    /// Token past its expiry.
    #[error("bearer token expired")]
    Expired,
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Bearer token verifier bound to the shared verifier key.
#[derive(Clone)]
pub struct TokenVerifier {
    /// Shared verifier key bytes.
    key: Vec<u8>,
}

impl TokenVerifier {
    /// Builds a verifier from the configured key.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
        }
    }

    /// Computes the verification tag for a payload.
    fn tag(&self, payload: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(payload);
        hasher.finalize().to_vec()
    }

    /// Verifies a bearer token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] for missing, malformed, mis-signed, or expired
    /// tokens.
    pub fn verify(&self, header: Option<&str>, now: Timestamp) -> Result<TokenClaims, AuthError> {
        let header = header.ok_or(AuthError::Missing)?;
        if header.len() > MAX_TOKEN_BYTES {
            return Err(AuthError::Malformed);
        }
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::Missing)?;
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let payload =
            URL_SAFE_NO_PAD.decode(payload_b64).map_err(|_| AuthError::Malformed)?;
        let presented_tag =
            URL_SAFE_NO_PAD.decode(tag_b64).map_err(|_| AuthError::Malformed)?;
        let expected_tag = self.tag(&payload);
        if expected_tag.ct_eq(&presented_tag).unwrap_u8() != 1 {
            return Err(AuthError::BadSignature);
        }
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if now > claims.expires_at {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Issues a token for the given claims (tests and local development).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] when the claims fail to serialize.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
        let tag = self.tag(&payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(&tag)
        ))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
