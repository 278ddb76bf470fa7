// tracehub-store-sqlite/src/lib.rs
// ============================================================================
// Module: TraceHub SQLite Store Library
// Description: Durable tenant-scoped data store backed by SQLite WAL.
// Purpose: Expose the tenant session API and the SQLite driver.
// Dependencies: rusqlite, serde_json, thiserror, tracehub-core
// ============================================================================

//! ## Overview
//! `tracehub-store-sqlite` persists every TraceHub entity in `SQLite` with
//! write-ahead logging. Entities are stored as canonical JSON snapshots next
//! to the indexed columns used for scoping and lookups. Every statement a
//! [`TenantSession`] issues carries the tenant predicate; a session without
//! an organization and without the system-admin flag reads zero rows and
//! refuses writes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod documents;
pub mod notify;
pub mod orgs;
pub mod shipments;
pub mod store;
pub mod tracking;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SessionScope;
pub use store::SqliteDataStore;
pub use store::SqliteStoreConfig;
pub use store::TenantSession;
