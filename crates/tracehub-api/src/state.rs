// tracehub-api/src/state.rs
// ============================================================================
// Module: Application State
// Description: Shared process-wide state for the HTTP surface.
// Purpose: Hold the store, drivers, matrix snapshot, and request plumbing.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! One [`AppState`] is built at boot and shared by every handler: the data
//! store, the blob and classifier drivers, the immutable compliance matrix
//! snapshot, the token verifier, the rate limiter, the notification bus, and
//! the security audit sink. Hot-reloading the matrix swaps the `Arc`, never
//! mutates the snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tracehub_core::AuditSink;
use tracehub_core::ComplianceMatrix;
use tracehub_core::interfaces::BlobStore;
use tracehub_core::interfaces::Clock;
use tracehub_core::interfaces::DocumentClassifier;
use tracehub_core::interfaces::Mailer;
use tracehub_store_sqlite::SqliteDataStore;

use crate::auth::TokenVerifier;
use crate::bus::NotificationBus;
use crate::cache::TenantSettingsCache;
use crate::ratelimit::RateLimiter;

// ============================================================================
// SECTION: App State
// ============================================================================

/// Shared application state.
pub struct AppState {
    /// Tenant-scoped data store.
    pub store: Arc<SqliteDataStore>,
    /// Blob driver.
    pub blob: Arc<dyn BlobStore>,
    /// Document classifier driver.
    pub classifier: Arc<dyn DocumentClassifier>,
    /// Mail transport (consumed by the outbox dispatcher).
    pub mailer: Arc<dyn Mailer>,
    /// Wall clock seam.
    pub clock: Arc<dyn Clock>,
    /// Immutable compliance matrix snapshot.
    pub matrix: Arc<ComplianceMatrix>,
    /// Bearer token verifier.
    pub verifier: TokenVerifier,
    /// Security audit sink for the request path.
    pub audit: Arc<dyn AuditSink>,
    /// Per-caller rate limiter.
    pub limiter: RateLimiter,
    /// In-process notification bus.
    pub bus: Arc<NotificationBus>,
    /// Per-tenant settings cache (60-second TTL, invalidated on mutation).
    pub settings_cache: Arc<TenantSettingsCache>,
    /// Storage bucket prefix.
    pub bucket_prefix: String,
}
