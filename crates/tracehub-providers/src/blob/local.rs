// tracehub-providers/src/blob/local.rs
// ============================================================================
// Module: Local Blob Driver
// Description: Directory-backed blob store for development and tests.
// Purpose: Mirror the tenant-scoped key layout on a local filesystem.
// Dependencies: tokio, tracehub-core
// ============================================================================

//! ## Overview
//! Blobs live under `{root}/{bucket}/{org_id}/{resource_id}/{filename}`.
//! Every file operation runs under the blob call deadline. Signed URLs are
//! `file://` pseudo-URLs carrying the expiry; they exist so development
//! environments exercise the same control flow as S3.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracehub_core::OrgId;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::BlobError;
use tracehub_core::interfaces::BlobKey;
use tracehub_core::interfaces::BlobStore;
use tracehub_core::interfaces::SignedUrl;

use crate::blob::DEFAULT_BLOB_DEADLINE;
use crate::blob::SIGNED_URL_TTL_MILLIS;
use crate::blob::validate_key;
use crate::blob::with_deadline;

// ============================================================================
// SECTION: Local Driver
// ============================================================================

/// Directory-backed blob store.
pub struct LocalBlobStore {
    /// Root directory.
    root: PathBuf,
    /// Per-call deadline.
    deadline: Duration,
}

impl LocalBlobStore {
    /// Builds a driver rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            deadline: DEFAULT_BLOB_DEADLINE,
        }
    }

    /// Returns a copy with the per-call deadline replaced.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolves the on-disk path for a validated key.
    fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.root
            .join(&key.bucket)
            .join(key.org_id.to_string())
            .join(&key.resource_id)
            .join(&key.filename)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, session_org: OrgId, key: &BlobKey, bytes: &[u8]) -> Result<(), BlobError> {
        validate_key(session_org, key)?;
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| BlobError::Io("blob path missing parent".to_string()))?
            .to_path_buf();
        with_deadline(self.deadline, async move {
            tokio::fs::create_dir_all(&parent)
                .await
                .map_err(|err| BlobError::Io(err.to_string()))?;
            tokio::fs::write(&path, bytes).await.map_err(|err| BlobError::Io(err.to_string()))
        })
        .await
    }

    async fn get(&self, session_org: OrgId, key: &BlobKey) -> Result<Vec<u8>, BlobError> {
        validate_key(session_org, key)?;
        let path = self.path_for(key);
        let rendered = key.render();
        with_deadline(self.deadline, async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(bytes),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(BlobError::NotFound(rendered))
                }
                Err(err) => Err(BlobError::Io(err.to_string())),
            }
        })
        .await
    }

    async fn signed_url(
        &self,
        session_org: OrgId,
        key: &BlobKey,
        now: Timestamp,
    ) -> Result<SignedUrl, BlobError> {
        validate_key(session_org, key)?;
        let path = self.path_for(key);
        Ok(SignedUrl {
            url: format!("file://{}", path.display()),
            expires_at: now.plus_millis(SIGNED_URL_TTL_MILLIS),
        })
    }

    async fn delete(&self, session_org: OrgId, key: &BlobKey) -> Result<(), BlobError> {
        validate_key(session_org, key)?;
        let path = self.path_for(key);
        let rendered = key.render();
        with_deadline(self.deadline, async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(BlobError::NotFound(rendered))
                }
                Err(err) => Err(BlobError::Io(err.to_string())),
            }
        })
        .await
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
