// tracehub-providers/src/blob/s3.rs
// ============================================================================
// Module: S3 Blob Driver
// Description: Object-store blob driver with presigned URLs.
// Purpose: Persist document files and audit packs in durable object storage.
// Dependencies: aws-config, aws-sdk-s3, tracehub-core
// ============================================================================

//! ## Overview
//! The S3 driver maps `{bucket}` keys onto `{bucket_prefix}-{bucket}` object
//! buckets, with object keys of `{org_id}/{resource_id}/{filename}`. Every
//! SDK call runs under the blob call deadline; signed URLs use SDK
//! presigning with the 15-minute ceiling. Storage is untrusted: keys are
//! validated before any request is issued.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
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
// SECTION: S3 Driver
// ============================================================================

/// S3-backed blob store.
pub struct S3BlobStore {
    /// SDK client.
    client: Client,
    /// Bucket name prefix (e.g. `tracehub-prod`).
    bucket_prefix: String,
    /// Per-call deadline.
    deadline: Duration,
}

impl S3BlobStore {
    /// Builds a driver from ambient AWS configuration.
    pub async fn from_env(bucket_prefix: &str) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
            bucket_prefix: bucket_prefix.to_string(),
            deadline: DEFAULT_BLOB_DEADLINE,
        }
    }

    /// Builds a driver from an explicit SDK client (tests and custom auth).
    #[must_use]
    pub fn with_client(client: Client, bucket_prefix: &str) -> Self {
        Self {
            client,
            bucket_prefix: bucket_prefix.to_string(),
            deadline: DEFAULT_BLOB_DEADLINE,
        }
    }

    /// Returns a copy with the per-call deadline replaced.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolves the object bucket name for a key.
    fn bucket_for(&self, key: &BlobKey) -> String {
        format!("{}-{}", self.bucket_prefix, key.bucket)
    }

    /// Resolves the object key (tenant segment first) for a key.
    fn object_key(key: &BlobKey) -> String {
        format!("{}/{}/{}", key.org_id, key.resource_id, key.filename)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, session_org: OrgId, key: &BlobKey, bytes: &[u8]) -> Result<(), BlobError> {
        validate_key(session_org, key)?;
        let request = self
            .client
            .put_object()
            .bucket(self.bucket_for(key))
            .key(Self::object_key(key))
            .body(ByteStream::from(bytes.to_vec()));
        with_deadline(self.deadline, async move {
            request.send().await.map_err(|err| BlobError::Transient(err.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, session_org: OrgId, key: &BlobKey) -> Result<Vec<u8>, BlobError> {
        validate_key(session_org, key)?;
        let rendered = key.render();
        let request = self
            .client
            .get_object()
            .bucket(self.bucket_for(key))
            .key(Self::object_key(key));
        with_deadline(self.deadline, async move {
            let response = request.send().await.map_err(|err| {
                let message = err.to_string();
                if message.contains("NoSuchKey") {
                    BlobError::NotFound(rendered)
                } else {
                    BlobError::Transient(message)
                }
            })?;
            let bytes = response
                .body
                .collect()
                .await
                .map_err(|err| BlobError::Io(err.to_string()))?;
            Ok(bytes.into_bytes().to_vec())
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
        let ttl = Duration::from_millis(
            u64::try_from(SIGNED_URL_TTL_MILLIS).unwrap_or(15 * 60 * 1_000),
        );
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|err| BlobError::Io(err.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(self.bucket_for(key))
            .key(Self::object_key(key));
        with_deadline(self.deadline, async move {
            let presigned = request
                .presigned(presigning)
                .await
                .map_err(|err| BlobError::Transient(err.to_string()))?;
            Ok(SignedUrl {
                url: presigned.uri().to_string(),
                expires_at: now.plus_millis(SIGNED_URL_TTL_MILLIS),
            })
        })
        .await
    }

    async fn delete(&self, session_org: OrgId, key: &BlobKey) -> Result<(), BlobError> {
        validate_key(session_org, key)?;
        let request = self
            .client
            .delete_object()
            .bucket(self.bucket_for(key))
            .key(Self::object_key(key));
        with_deadline(self.deadline, async move {
            request.send().await.map_err(|err| BlobError::Transient(err.to_string()))?;
            Ok(())
        })
        .await
    }
}
