// tracehub-tracking/src/ingestor/tests.rs
// ============================================================================
// Module: Ingestor Unit Tests
// Description: Tests for event-driven advancement and failure handling.
// Purpose: Pin the departed-event scenario, dedup, and poll suspension.
// Dependencies: tracehub-core, tracehub-store-sqlite, tracehub-tracking
// ============================================================================

//! ## Overview
//! A departed carrier event moves a docs-complete shipment to `in_transit`
//! and produces one `shipment_departed` notification; a duplicate ingest
//! produces neither a row nor a notification. Permanent carrier failures
//! suspend polling.

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

use std::sync::Arc;
use std::sync::Mutex;

use tracehub_config::PollIntervals;
use tracehub_config::WorkerConfig;
use tracehub_core::ComplianceMatrix;
use tracehub_core::DocumentEvent;
use tracehub_core::EventSource;
use tracehub_core::EventStatus;
use tracehub_core::FixedClock;
use tracehub_core::Notification;
use tracehub_core::NotificationKind;
use tracehub_core::NormalizedEvent;
use tracehub_core::OrgType;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::SystemRole;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::CarrierClient;
use tracehub_core::interfaces::CarrierError;
use tracehub_core::interfaces::Notifier;
use tracehub_core::interfaces::NotifyError;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::SqliteDataStore;
use tracehub_store_sqlite::SqliteStoreConfig;
use tracehub_store_sqlite::documents::NewDocument;
use tracehub_store_sqlite::orgs::NewOrganization;
use tracehub_store_sqlite::orgs::NewUser;
use tracehub_store_sqlite::shipments::NewShipment;

use super::Ingestor;
use super::PollOutcome;

// ============================================================================
// SECTION: Test Doubles
// ============================================================================

/// Carrier returning a fixed script on every fetch.
struct ScriptedCarrier {
    /// Events returned by every fetch.
    events: Vec<NormalizedEvent>,
}

impl CarrierClient for ScriptedCarrier {
    fn fetch_events(
        &self,
        _container_number: &str,
        _since: Option<Timestamp>,
    ) -> Result<Vec<NormalizedEvent>, CarrierError> {
        Ok(self.events.clone())
    }
}

/// Carrier rejecting every container (4xx).
struct RejectingCarrier;

impl CarrierClient for RejectingCarrier {
    fn fetch_events(
        &self,
        _container_number: &str,
        _since: Option<Timestamp>,
    ) -> Result<Vec<NormalizedEvent>, CarrierError> {
        Err(CarrierError::Permanent("404 container unknown".to_string()))
    }
}

/// Notifier collecting published notifications.
#[derive(Default)]
struct CollectingNotifier {
    /// Published notifications in order.
    published: Mutex<Vec<Notification>>,
}

impl Notifier for CollectingNotifier {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.published
            .lock()
            .map_err(|_| NotifyError::Publish("poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed test instant.
const T0: Timestamp = Timestamp::from_unix_millis(1_770_000_000_000);

/// Seeded single-shipment world ready for polling.
struct Rig {
    /// Backing store.
    store: Arc<SqliteDataStore>,
    /// Notifier double.
    notifier: Arc<CollectingNotifier>,
    /// Shipment under test.
    shipment_id: ShipmentId,
}

/// Builds a docs-complete shipment with a container number.
fn rig() -> Rig {
    let store = Arc::new(SqliteDataStore::open(&SqliteStoreConfig::in_memory()).unwrap());
    let bootstrap = store.session(SessionScope::worker());
    let org = bootstrap
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
    let user = bootstrap
        .create_user(
            &NewUser {
                email: "ops@vibotaj.example".to_string(),
                password_hash: "argon2-hash".to_string(),
                full_name: "Supplier Ops".to_string(),
                role: SystemRole::Supplier,
                organization_id: org.id,
            },
            T0,
        )
        .unwrap();

    let session = store.session(SessionScope::tenant(org.id, user.id));
    let shipment = session
        .create_shipment(
            &NewShipment {
                organization_id: org.id,
                buyer_organization_id: None,
                reference: "VIBO-2026-001".to_string(),
                product_type: "horn_hoof".to_string(),
                incoterms: Some("CIF".to_string()),
                is_historical: false,
            },
            T0,
        )
        .unwrap();

    let matrix = ComplianceMatrix::builtin();
    for (index, doc_type) in matrix.required_documents("horn_hoof").into_iter().enumerate() {
        let now = T0.plus_millis(i64::try_from(index).unwrap_or(0) * 1_000);
        let document = session
            .insert_document(
                &NewDocument {
                    shipment_id: shipment.id,
                    document_type: doc_type,
                    file_name: format!("doc-{index}.pdf"),
                    file_path: format!("documents/1/1/doc-{index}.pdf"),
                    file_size: 1_024,
                    mime_type: "application/pdf".to_string(),
                    checksum: format!("checksum-{index}"),
                    reference_number: Some(format!("REF-{index}")),
                    issue_date: None,
                    expiry_date: None,
                    issuing_authority: None,
                    canonical_data: None,
                    classification_confidence: None,
                },
                now,
            )
            .unwrap();
        session.transition_document(document.id, DocumentEvent::Approved, None, now).unwrap();
        session
            .transition_document(document.id, DocumentEvent::CompliancePassed, None, now)
            .unwrap();
    }
    session.recompute_shipment_status(shipment.id, &matrix, T0.plus_millis(30_000)).unwrap();

    let mut shipment = session.get_shipment(shipment.id).unwrap();
    shipment.container_number = Some("MSCU1234567".to_string());
    session.update_shipment(&shipment, T0.plus_millis(31_000)).unwrap();

    Rig {
        store,
        notifier: Arc::new(CollectingNotifier::default()),
        shipment_id: shipment.id,
    }
}

/// Builds an ingestor over the rig with the given carrier.
fn ingestor(rig: &Rig, carrier: Arc<dyn CarrierClient>) -> Ingestor {
    Ingestor::new(
        Arc::clone(&rig.store),
        carrier,
        Arc::clone(&rig.notifier) as Arc<dyn Notifier>,
        Arc::new(FixedClock(T0.plus_millis(60_000))),
        Arc::new(ComplianceMatrix::builtin()),
        PollIntervals::default(),
        WorkerConfig {
            max_retries: 1,
            ..WorkerConfig::default()
        },
    )
}

/// Builds the departed event used across the tests.
fn departed_event() -> NormalizedEvent {
    NormalizedEvent {
        status: EventStatus::Departed,
        event_time: Timestamp::parse_rfc3339("2026-02-15T10:00:00Z").unwrap(),
        location_code: Some("NGAPP".to_string()),
        location_name: Some("Apapa".to_string()),
        vessel: Some("MSC AURORA".to_string()),
        voyage: Some("AW428A".to_string()),
        source: EventSource::new("carrier-api"),
        raw_payload: None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn departed_event_moves_shipment_to_in_transit() {
    let rig = rig();
    let carrier = Arc::new(ScriptedCarrier {
        events: vec![departed_event()],
    });
    let ingestor = ingestor(&rig, carrier);
    let session = rig.store.session(SessionScope::worker());
    let shipment = session.get_shipment(rig.shipment_id).unwrap();

    let outcome = ingestor.poll_shipment(&shipment).unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Ingested {
            inserted: 1,
            transition: Some((ShipmentStatus::DocsComplete, ShipmentStatus::InTransit)),
        }
    );

    let shipment = session.get_shipment(rig.shipment_id).unwrap();
    assert_eq!(shipment.status, ShipmentStatus::InTransit);

    let published = rig.notifier.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, NotificationKind::ShipmentDeparted);
}

#[test]
fn duplicate_event_produces_no_row_and_no_notification() {
    let rig = rig();
    let carrier = Arc::new(ScriptedCarrier {
        events: vec![departed_event()],
    });
    let ingestor = ingestor(&rig, carrier);
    let session = rig.store.session(SessionScope::worker());
    let shipment = session.get_shipment(rig.shipment_id).unwrap();

    ingestor.poll_shipment(&shipment).unwrap();
    let shipment = session.get_shipment(rig.shipment_id).unwrap();
    let outcome = ingestor.poll_shipment(&shipment).unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Ingested {
            inserted: 0,
            transition: None,
        }
    );

    let events = session.events_for_shipment(rig.shipment_id).unwrap();
    assert_eq!(events.len(), 1);
    let published = rig.notifier.published.lock().unwrap();
    assert_eq!(published.len(), 1);
}

#[test]
fn permanent_failure_suspends_polling() {
    let rig = rig();
    let ingestor = ingestor(&rig, Arc::new(RejectingCarrier));
    let session = rig.store.session(SessionScope::worker());
    let shipment = session.get_shipment(rig.shipment_id).unwrap();

    let outcome = ingestor.poll_shipment(&shipment).unwrap();
    assert_eq!(outcome, PollOutcome::Suspended);

    let shipment = session.get_shipment(rig.shipment_id).unwrap();
    assert!(shipment.tracking_error.is_some());
    assert!(session.pollable_shipments().unwrap().is_empty());

    let published = rig.notifier.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, NotificationKind::TrackingSuspended);
}

#[test]
fn poll_intervals_follow_shipment_state() {
    let rig = rig();
    let ingestor = ingestor(
        &rig,
        Arc::new(ScriptedCarrier {
            events: Vec::new(),
        }),
    );
    assert_eq!(
        ingestor.poll_interval_for(ShipmentStatus::InTransit),
        std::time::Duration::from_secs(3_600)
    );
    assert_eq!(
        ingestor.poll_interval_for(ShipmentStatus::Arrived),
        std::time::Duration::from_secs(1_800)
    );
    assert_eq!(
        ingestor.poll_interval_for(ShipmentStatus::Customs),
        std::time::Duration::from_secs(1_800)
    );
    assert_eq!(
        ingestor.poll_interval_for(ShipmentStatus::DocsComplete),
        std::time::Duration::from_secs(21_600)
    );
}
