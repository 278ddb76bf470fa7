// tracehub-providers/src/blob/mod.rs
// ============================================================================
// Module: Blob Drivers
// Description: Local-directory and S3 implementations of the blob seam.
// Purpose: Group blob drivers and their shared key validation.
// Dependencies: tracehub-core
// ============================================================================

//! ## Overview
//! Both drivers enforce the same tenant rule before touching storage: the
//! key's organization segment must equal the session organization. Key
//! segments are validated against traversal and length limits, and every
//! storage operation runs under the blob call deadline (default 30 seconds).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod local;
pub mod s3;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tracehub_core::OrgId;
use tracehub_core::interfaces::BlobError;
use tracehub_core::interfaces::BlobKey;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single key segment.
const MAX_SEGMENT_LENGTH: usize = 255;
/// Signed URL time-to-live in milliseconds (15 minutes).
pub(crate) const SIGNED_URL_TTL_MILLIS: i64 = 15 * 60 * 1_000;
/// Default blob call deadline.
pub(crate) const DEFAULT_BLOB_DEADLINE: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Deadlines
// ============================================================================

/// Runs a storage operation under the blob call deadline.
///
/// # Errors
///
/// Returns [`BlobError::Transient`] when the deadline elapses; the caller's
/// retry policy treats it like any other transient driver failure.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T, BlobError>
where
    F: Future<Output = Result<T, BlobError>>,
{
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(BlobError::Transient(format!(
            "blob deadline exceeded after {}ms",
            deadline.as_millis()
        ))),
    }
}

// ============================================================================
// SECTION: Key Validation
// ============================================================================

/// Validates a key against the session tenant and traversal rules.
///
/// # Errors
///
/// Returns [`BlobError::TenantMismatch`] when the key's organization segment
/// differs from the session organization, and [`BlobError::Io`] for invalid
/// segments.
pub(crate) fn validate_key(session_org: OrgId, key: &BlobKey) -> Result<(), BlobError> {
    if key.org_id != session_org {
        return Err(BlobError::TenantMismatch(format!(
            "key organization {} does not match session organization {session_org}",
            key.org_id
        )));
    }
    for segment in [key.bucket.as_str(), key.resource_id.as_str(), key.filename.as_str()] {
        if segment.is_empty()
            || segment.len() > MAX_SEGMENT_LENGTH
            || segment.contains('/')
            || segment.contains('\\')
            || segment == "."
            || segment == ".."
        {
            return Err(BlobError::Io(format!("invalid key segment: {segment:?}")));
        }
    }
    Ok(())
}
