// tracehub-api/src/cache.rs
// ============================================================================
// Module: Tenant Settings Cache
// Description: Bounded in-process cache for per-tenant organization settings.
// Purpose: Keep hot settings reads off the store with a short TTL.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Per-tenant settings are read-mostly: the cache holds a bounded number of
//! entries with a 60-second TTL and is invalidated on mutation. Readers get
//! a cloned snapshot (copy-on-write semantics); writers never mutate a
//! cached value in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use tracehub_core::OrgId;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::StoreError;
use tracehub_core::org::OrgSettings;
use tracehub_store_sqlite::TenantSession;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache entry time-to-live in milliseconds (60 seconds).
const SETTINGS_TTL_MILLIS: u64 = 60_000;
/// Maximum cached organizations.
const MAX_ENTRIES: usize = 4_096;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// One cached settings snapshot.
#[derive(Debug, Clone)]
struct Entry {
    /// Cached settings.
    settings: OrgSettings,
    /// Load instant.
    loaded_at: Timestamp,
}

/// Bounded per-tenant settings cache.
#[derive(Default)]
pub struct TenantSettingsCache {
    /// Entries keyed by organization.
    entries: Mutex<HashMap<OrgId, Entry>>,
}

impl TenantSettingsCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the settings for an organization, loading on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the load fails.
    pub fn get_or_load(
        &self,
        session: &TenantSession<'_>,
        org_id: OrgId,
        now: Timestamp,
    ) -> Result<OrgSettings, StoreError> {
        if let Ok(entries) = self.entries.lock() {
            if let Some(entry) = entries.get(&org_id) {
                if entry.loaded_at.abs_diff_millis(now) < SETTINGS_TTL_MILLIS {
                    return Ok(entry.settings.clone());
                }
            }
        }
        let settings = session.get_organization(org_id)?.settings;
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= MAX_ENTRIES && !entries.contains_key(&org_id) {
                let oldest =
                    entries.iter().min_by_key(|(_, entry)| entry.loaded_at).map(|(key, _)| *key);
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
            entries.insert(
                org_id,
                Entry {
                    settings: settings.clone(),
                    loaded_at: now,
                },
            );
        }
        Ok(settings)
    }

    /// Drops the cached entry for an organization (called on mutation).
    pub fn invalidate(&self, org_id: OrgId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&org_id);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
