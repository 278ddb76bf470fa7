// tracehub-api/src/cache/tests.rs
// ============================================================================
// Module: Settings Cache Unit Tests
// Description: Tests for TTL expiry and invalidation.
// Purpose: Pin the 60-second TTL and mutation invalidation.
// Dependencies: tracehub-api, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! A cached entry serves within its TTL, expires after it, and disappears on
//! invalidation.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracehub_core::OrgType;
use tracehub_core::Timestamp;
use tracehub_core::org::OrgSettings;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::SqliteDataStore;
use tracehub_store_sqlite::SqliteStoreConfig;
use tracehub_store_sqlite::orgs::NewOrganization;

use super::TenantSettingsCache;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed base instant.
const T0: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

/// Seeds a store with one supplier organization.
fn seeded() -> (SqliteDataStore, tracehub_core::OrgId) {
    let store = SqliteDataStore::open(&SqliteStoreConfig::in_memory()).unwrap();
    let session = store.session(SessionScope::worker());
    let org = session
        .create_organization(
            &NewOrganization {
                name: "VIBOTAJ Global".to_string(),
                slug: "vibotaj".to_string(),
                org_type: OrgType::Supplier,
                contact_email: None,
                address: None,
            },
            T0,
        )
        .unwrap();
    (store, org.id)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn cached_entry_serves_within_ttl() {
    let (store, org_id) = seeded();
    let cache = TenantSettingsCache::new();
    let session = store.session(SessionScope::worker());

    let first = cache.get_or_load(&session, org_id, T0).unwrap();
    assert_eq!(first.archive_quiescence_days, 14);

    // A store-side change is invisible until the TTL lapses.
    session
        .update_org_settings(
            org_id,
            OrgSettings {
                schema_version: 1,
                archive_quiescence_days: 30,
                sidecar: None,
            },
            T0.plus_millis(1_000),
        )
        .unwrap();
    let cached = cache.get_or_load(&session, org_id, T0.plus_millis(2_000)).unwrap();
    assert_eq!(cached.archive_quiescence_days, 14);
}

#[test]
fn entry_expires_after_ttl() {
    let (store, org_id) = seeded();
    let cache = TenantSettingsCache::new();
    let session = store.session(SessionScope::worker());

    cache.get_or_load(&session, org_id, T0).unwrap();
    session
        .update_org_settings(
            org_id,
            OrgSettings {
                schema_version: 1,
                archive_quiescence_days: 30,
                sidecar: None,
            },
            T0.plus_millis(1_000),
        )
        .unwrap();
    let reloaded = cache.get_or_load(&session, org_id, T0.plus_millis(61_000)).unwrap();
    assert_eq!(reloaded.archive_quiescence_days, 30);
}

#[test]
fn invalidation_forces_a_reload() {
    let (store, org_id) = seeded();
    let cache = TenantSettingsCache::new();
    let session = store.session(SessionScope::worker());

    cache.get_or_load(&session, org_id, T0).unwrap();
    session
        .update_org_settings(
            org_id,
            OrgSettings {
                schema_version: 1,
                archive_quiescence_days: 7,
                sidecar: None,
            },
            T0.plus_millis(1_000),
        )
        .unwrap();
    cache.invalidate(org_id);
    let reloaded = cache.get_or_load(&session, org_id, T0.plus_millis(2_000)).unwrap();
    assert_eq!(reloaded.archive_quiescence_days, 7);
}
