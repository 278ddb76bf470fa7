// tracehub-core/src/interfaces/mod.rs
// ============================================================================
// Module: TraceHub Interfaces
// Description: Backend-agnostic seams for storage, carriers, and delivery.
// Purpose: Define the contract surfaces implemented by pluggable drivers.
// Dependencies: crate::core, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine integrates with external systems without
//! embedding driver-specific details. Implementations must fail closed on
//! missing or invalid data; tenant scoping violations are surfaced as typed
//! errors, never silently absorbed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::document::CanonicalData;
use crate::core::document::DetectionMethod;
use crate::core::document::DocumentType;
use crate::core::identifiers::OrgId;
use crate::core::notify::Notification;
use crate::core::time::Timestamp;
use crate::core::tracking::NormalizedEvent;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock seam; the pure core never reads time directly.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// System clock reading the host wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Timestamp::from_unix_millis(millis)
    }
}

/// Fixed clock for deterministic tests.
///
/// # Invariants
/// - Always returns the instant supplied at construction.
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Data store errors shared across drivers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Session carries no organization and no system-admin flag.
    #[error("unscoped session: tenant context required")]
    Unscoped,
    /// A write named an organization other than the session's.
    #[error("tenant mismatch: write targeted organization {target} from session {session}")]
    TenantMismatch {
        /// Organization the write targeted.
        target: OrgId,
        /// Organization bound to the session.
        session: OrgId,
    },
    /// Row not found (or not visible to the session's tenant).
    #[error("not found: {0}")]
    NotFound(String),
    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Lifecycle transition not legal.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// Invitation token already consumed.
    #[error("invitation already used")]
    AlreadyUsed,
    /// Invitation past its expiry window.
    #[error("invitation expired")]
    Expired,
    /// Removing the last active admin member of an organization.
    #[error("organization must retain at least one active admin member")]
    LastAdmin,
    /// EUDR artefacts attached to an excluded commodity.
    #[error("eudr artefacts rejected: {0}")]
    EudrExcluded(String),
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// Tenant-scoped blob key (`{bucket}/{org_id}/{resource_id}/{filename}`).
///
/// # Invariants
/// - The first path segment after the bucket is always the owning org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobKey {
    /// Storage bucket (`documents`, `audit-packs`, `exports`).
    pub bucket: String,
    /// Owning organization.
    pub org_id: OrgId,
    /// Resource identifier segment.
    pub resource_id: String,
    /// File name segment.
    pub filename: String,
}

impl BlobKey {
    /// Renders the key as a slash-joined path.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}/{}/{}/{}", self.bucket, self.org_id, self.resource_id, self.filename)
    }
}

/// Blob store errors.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Key's organization segment does not match the session tenant.
    #[error("blob key tenant mismatch: {0}")]
    TenantMismatch(String),
    /// Blob not found.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// Transient driver failure (retryable).
    #[error("blob transient error: {0}")]
    Transient(String),
    /// Driver I/O error.
    #[error("blob io error: {0}")]
    Io(String),
}

/// Signed URL with a bounded time-to-live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    /// Presigned URL.
    pub url: String,
    /// Expiry instant (at most 15 minutes after issuance).
    pub expires_at: Timestamp,
}

/// Object storage seam for document files and audit packs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes blob bytes under a tenant-scoped key.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the key violates tenant scoping or the
    /// driver fails.
    async fn put(&self, session_org: OrgId, key: &BlobKey, bytes: &[u8]) -> Result<(), BlobError>;

    /// Reads blob bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the key violates tenant scoping, the blob
    /// is missing, or the driver fails.
    async fn get(&self, session_org: OrgId, key: &BlobKey) -> Result<Vec<u8>, BlobError>;

    /// Issues a signed URL scoped to the caller's tenant (TTL <= 15 minutes).
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the key violates tenant scoping or the
    /// driver fails.
    async fn signed_url(
        &self,
        session_org: OrgId,
        key: &BlobKey,
        now: Timestamp,
    ) -> Result<SignedUrl, BlobError>;

    /// Deletes a blob.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the key violates tenant scoping or the
    /// driver fails.
    async fn delete(&self, session_org: OrgId, key: &BlobKey) -> Result<(), BlobError>;
}

// ============================================================================
// SECTION: Carrier Client
// ============================================================================

/// Carrier adapter errors.
///
/// Transient failures back off and retry; permanent failures suspend polling
/// for the shipment until operator action.
#[derive(Debug, Error)]
pub enum CarrierError {
    /// Retryable failure (network, 5xx, timeout).
    #[error("carrier transient error: {0}")]
    Transient(String),
    /// Non-retryable failure (4xx from the provider).
    #[error("carrier permanent error: {0}")]
    Permanent(String),
}

/// External container tracking provider.
pub trait CarrierClient: Send + Sync {
    /// Fetches normalized events for a container since the given instant.
    ///
    /// # Errors
    ///
    /// Returns [`CarrierError::Transient`] for retryable failures and
    /// [`CarrierError::Permanent`] for provider rejections.
    fn fetch_events(
        &self,
        container_number: &str,
        since: Option<Timestamp>,
    ) -> Result<Vec<NormalizedEvent>, CarrierError>;
}

// ============================================================================
// SECTION: Document Classifier
// ============================================================================

/// Classifier errors.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Retryable failure.
    #[error("classifier transient error: {0}")]
    Transient(String),
    /// Input cannot be classified.
    #[error("classifier rejected input: {0}")]
    Rejected(String),
}

/// Structured classification of one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDocument {
    /// Detected document type.
    pub document_type: DocumentType,
    /// Detected reference number.
    pub reference_number: Option<String>,
    /// Typed structured extraction.
    pub canonical_data: Option<CanonicalData>,
    /// Classification confidence within [0, 1].
    pub confidence: f64,
    /// Detection method used.
    pub detection_method: DetectionMethod,
}

/// AI/OCR classification pipeline (model internals are opaque).
pub trait DocumentClassifier: Send + Sync {
    /// Classifies raw document bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError`] when classification fails.
    fn classify(&self, bytes: &[u8], mime_type: &str) -> Result<ClassifiedDocument, ClassifierError>;
}

// ============================================================================
// SECTION: Mailer
// ============================================================================

/// Mailer errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Retryable transport failure.
    #[error("mail transient error: {0}")]
    Transient(String),
    /// Message rejected by the transport.
    #[error("mail rejected: {0}")]
    Rejected(String),
}

/// Provider-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// Email transport seam.
pub trait Mailer: Send + Sync {
    /// Sends a templated message.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] when the transport fails or rejects the message.
    fn send(&self, to: &str, template: &str, vars: &Value) -> Result<MessageId, MailError>;
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notifier errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Publish failure.
    #[error("notify error: {0}")]
    Publish(String),
}

/// In-process pub/sub seam consumed by lifecycle hooks.
pub trait Notifier: Send + Sync {
    /// Publishes a notification to subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when publication fails.
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}
