// tracehub-store-sqlite/tests/helpers/mod.rs
// ============================================================================
// Module: Store Test Helpers
// Description: Shared fixtures for store integration tests.
// Purpose: Seed a two-tenant world with users and shipments.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Builds an in-memory store seeded with the platform organization, a
//! supplier (VIBOTAJ), a buyer (HAGES), and one user per organization.

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
    dead_code,
    reason = "Test-only fixtures; not every helper is used by every suite."
)]

use tracehub_core::OrgId;
use tracehub_core::OrgType;
use tracehub_core::ShipmentId;
use tracehub_core::SystemRole;
use tracehub_core::Timestamp;
use tracehub_core::UserId;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::SqliteDataStore;
use tracehub_store_sqlite::SqliteStoreConfig;
use tracehub_store_sqlite::orgs::NewOrganization;
use tracehub_store_sqlite::orgs::NewUser;
use tracehub_store_sqlite::shipments::NewShipment;

/// Fixed seeding instant.
pub const T0: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

/// Seeded two-tenant world.
pub struct World {
    /// Backing store.
    pub store: SqliteDataStore,
    /// Platform organization.
    pub platform: OrgId,
    /// Supplier organization (shipment owner).
    pub supplier: OrgId,
    /// Buyer organization (read-side tenant).
    pub buyer: OrgId,
    /// Platform admin user.
    pub admin_user: UserId,
    /// Supplier-side user.
    pub supplier_user: UserId,
    /// Buyer-side user.
    pub buyer_user: UserId,
}

/// Builds the seeded world.
pub fn world() -> World {
    let store = SqliteDataStore::open(&SqliteStoreConfig::in_memory()).unwrap();
    let bootstrap = store.session(SessionScope::worker());

    let platform = bootstrap
        .create_organization(
            &NewOrganization {
                name: "TraceHub".to_string(),
                slug: "tracehub".to_string(),
                org_type: OrgType::Platform,
                contact_email: None,
                address: None,
            },
            T0,
        )
        .unwrap();
    let supplier = bootstrap
        .create_organization(
            &NewOrganization {
                name: "VIBOTAJ Global".to_string(),
                slug: "vibotaj".to_string(),
                org_type: OrgType::Supplier,
                contact_email: Some("ops@vibotaj.example".to_string()),
                address: None,
            },
            T0,
        )
        .unwrap();
    let buyer = bootstrap
        .create_organization(
            &NewOrganization {
                name: "HAGES GmbH".to_string(),
                slug: "hages".to_string(),
                org_type: OrgType::Buyer,
                contact_email: None,
                address: None,
            },
            T0,
        )
        .unwrap();

    let admin_user = bootstrap
        .create_user(
            &NewUser {
                email: "admin@tracehub.example".to_string(),
                password_hash: "argon2-hash".to_string(),
                full_name: "Platform Admin".to_string(),
                role: SystemRole::Admin,
                organization_id: platform.id,
            },
            T0,
        )
        .unwrap();
    let supplier_user = bootstrap
        .create_user(
            &NewUser {
                email: "ops@vibotaj.example".to_string(),
                password_hash: "argon2-hash".to_string(),
                full_name: "Supplier Ops".to_string(),
                role: SystemRole::Supplier,
                organization_id: supplier.id,
            },
            T0,
        )
        .unwrap();
    let buyer_user = bootstrap
        .create_user(
            &NewUser {
                email: "import@hages.example".to_string(),
                password_hash: "argon2-hash".to_string(),
                full_name: "Buyer Import".to_string(),
                role: SystemRole::Buyer,
                organization_id: buyer.id,
            },
            T0,
        )
        .unwrap();

    World {
        store,
        platform: platform.id,
        supplier: supplier.id,
        buyer: buyer.id,
        admin_user: admin_user.id,
        supplier_user: supplier_user.id,
        buyer_user: buyer_user.id,
    }
}

impl World {
    /// Opens a supplier-scoped session.
    pub fn supplier_session(&self) -> tracehub_store_sqlite::TenantSession<'_> {
        self.store.session(SessionScope::tenant(self.supplier, self.supplier_user))
    }

    /// Opens a buyer-scoped session.
    pub fn buyer_session(&self) -> tracehub_store_sqlite::TenantSession<'_> {
        self.store.session(SessionScope::tenant(self.buyer, self.buyer_user))
    }

    /// Opens a system-admin session.
    pub fn admin_session(&self) -> tracehub_store_sqlite::TenantSession<'_> {
        self.store.session(SessionScope::system_admin(self.admin_user))
    }

    /// Creates a supplier-owned shipment, optionally shared with the buyer.
    pub fn shipment(&self, reference: &str, shared_with_buyer: bool) -> ShipmentId {
        let session = self.supplier_session();
        let shipment = session
            .create_shipment(
                &NewShipment {
                    organization_id: self.supplier,
                    buyer_organization_id: shared_with_buyer.then_some(self.buyer),
                    reference: reference.to_string(),
                    product_type: "horn_hoof".to_string(),
                    incoterms: Some("CIF".to_string()),
                    is_historical: false,
                },
                T0,
            )
            .unwrap();
        shipment.id
    }
}
