// tracehub-store-sqlite/tests/tenant_isolation.rs
// ============================================================================
// Module: Tenant Isolation Tests
// Description: Cross-tenant read/write denial and the buyer read path.
// Purpose: Verify no session observes or mutates a foreign tenant's rows.
// Dependencies: tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! For organizations A and B with neither system-admin: no read or write as
//! B can observe or mutate an entity created under A. Buyer organizations
//! hold a read-only view of explicitly shared shipments. Unscoped sessions
//! read zero rows.

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

mod helpers;

use helpers::T0;
use helpers::world;
use tracehub_core::interfaces::StoreError;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::shipments::NewShipment;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn foreign_tenant_cannot_read_unshared_shipment() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-001", false);

    let err = world.buyer_session().get_shipment(shipment_id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "cross-tenant read must look missing");
}

#[test]
fn buyer_reads_shared_shipment_but_cannot_write() {
    let world = world();
    let shipment_id = world.shipment("VIBO-2026-002", true);

    let buyer = world.buyer_session();
    let shipment = buyer.get_shipment(shipment_id).unwrap();
    assert_eq!(shipment.reference, "VIBO-2026-002");

    let err = buyer.require_shipment_write(shipment_id).unwrap_err();
    assert!(matches!(err, StoreError::TenantMismatch { .. }));
}

#[test]
fn foreign_tenant_listing_is_empty() {
    let world = world();
    world.shipment("VIBO-2026-003", false);

    let listed = world.buyer_session().list_shipments(100).unwrap();
    assert!(listed.is_empty());
}

#[test]
fn cross_tenant_create_fails_tenant_mismatch() {
    let world = world();
    let err = world
        .buyer_session()
        .create_shipment(
            &NewShipment {
                organization_id: world.supplier,
                buyer_organization_id: None,
                reference: "SNEAKY-001".to_string(),
                product_type: "horn_hoof".to_string(),
                incoterms: None,
                is_historical: false,
            },
            T0,
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::TenantMismatch { .. }));
}

#[test]
fn unscoped_session_reads_nothing_and_writes_nothing() {
    let world = world();
    world.shipment("VIBO-2026-004", true);

    let unscoped = world.store.session(SessionScope {
        org_id: None,
        is_system_admin: false,
        user_id: None,
        request_id: None,
    });
    assert!(matches!(unscoped.list_shipments(10).unwrap_err(), StoreError::Unscoped));
    assert!(matches!(
        unscoped
            .create_shipment(
                &NewShipment {
                    organization_id: world.supplier,
                    buyer_organization_id: None,
                    reference: "GHOST-001".to_string(),
                    product_type: "horn_hoof".to_string(),
                    incoterms: None,
                    is_historical: false,
                },
                T0,
            )
            .unwrap_err(),
        StoreError::Unscoped
    ));
}

#[test]
fn system_admin_sees_every_tenant() {
    let world = world();
    world.shipment("VIBO-2026-005", false);

    let listed = world.admin_session().list_shipments(100).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn duplicate_reference_conflicts_within_owner_only() {
    let world = world();
    world.shipment("VIBO-2026-006", false);

    // Same reference under the same owner conflicts.
    let err = world
        .supplier_session()
        .create_shipment(
            &NewShipment {
                organization_id: world.supplier,
                buyer_organization_id: None,
                reference: "VIBO-2026-006".to_string(),
                product_type: "horn_hoof".to_string(),
                incoterms: None,
                is_historical: false,
            },
            T0,
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn audit_trail_is_tenant_scoped() {
    let world = world();
    world.shipment("VIBO-2026-007", false);

    let supplier_audit = world.supplier_session().list_audit(100).unwrap();
    assert!(!supplier_audit.is_empty());

    let buyer_audit = world.buyer_session().list_audit(100).unwrap();
    assert!(buyer_audit.is_empty());
}
