// tracehub-api/src/bus.rs
// ============================================================================
// Module: Notification Bus
// Description: In-process pub/sub plus the outbox and expiry workers.
// Purpose: Fan notifications out to the feed and the email dispatcher.
// Dependencies: tokio, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! Every notification is durable before fan-out: lifecycle hooks insert the
//! outbox row through the store, then the bus broadcasts to in-process
//! subscribers. The email dispatcher drains unconsumed outbox rows through
//! the `Mailer` seam, gated by per-user preferences; delivery is
//! at-least-once and consumers key idempotency on the notification id. The
//! expiry sweeper moves documents past their expiry date and archives
//! delivered shipments past their tenant's quiescence window. Both workers
//! wrap every iteration in a recover boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::watch;
use tracehub_core::MILLIS_PER_DAY;
use tracehub_core::Notification;
use tracehub_core::NotificationChannel;
use tracehub_core::NotificationKind;
use tracehub_core::ShipmentStatus;
use tracehub_core::interfaces::Clock;
use tracehub_core::interfaces::Mailer;
use tracehub_core::interfaces::Notifier;
use tracehub_core::interfaces::NotifyError;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::SqliteDataStore;

use crate::cache::TenantSettingsCache;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Broadcast channel capacity; slow subscribers observe lag, not loss of
/// durability (the outbox row remains).
const BROADCAST_CAPACITY: usize = 1_024;
/// Dispatcher poll tick.
const DISPATCH_TICK: Duration = Duration::from_secs(15);
/// Sweeper tick.
const SWEEP_TICK: Duration = Duration::from_secs(300);
/// Outbox batch size per dispatcher iteration.
const OUTBOX_BATCH: usize = 64;

// ============================================================================
// SECTION: Bus
// ============================================================================

/// In-process notification bus.
pub struct NotificationBus {
    /// Broadcast channel feeding in-process subscribers.
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus {
    /// Builds a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribes to live notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Notifier for NotificationBus {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        // No live subscriber is fine; the durable row already exists.
        let _ = self.sender.send(notification.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Email Dispatcher
// ============================================================================

/// Runs the email dispatcher until shutdown.
///
/// Each iteration drains a bounded outbox batch: rows whose target user has
/// the email channel enabled for the kind are handed to the mailer, then
/// marked consumed. A failing iteration is recorded and the loop continues.
pub async fn run_email_dispatcher(
    store: Arc<SqliteDataStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(DISPATCH_TICK);
    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
        dispatch_outbox_once(&store, mailer.as_ref(), clock.as_ref());
    }
}

/// Drains one outbox batch; errors abort the iteration, never the worker.
fn dispatch_outbox_once(store: &SqliteDataStore, mailer: &dyn Mailer, clock: &dyn Clock) {
    let session = store.session(SessionScope::worker());
    let Ok(pending) = session.outbox_pending(OUTBOX_BATCH) else {
        return;
    };
    let now = clock.now();
    for notification in pending {
        let email_enabled = notification.user_id.is_none_or(|user| {
            session
                .notification_preferences(user)
                .map(|prefs| prefs.channels_for(notification.kind).contains(&NotificationChannel::Email))
                .unwrap_or(false)
        });
        if email_enabled {
            let vars = json!({
                "message": notification.message,
                "kind": notification.kind.as_str(),
                "payload": notification.payload,
            });
            let recipient = format!("org-{}@feed.tracehub.internal", notification.organization_id);
            if mailer.send(&recipient, notification.kind.as_str(), &vars).is_err() {
                // Leave the row unconsumed; the next iteration retries.
                continue;
            }
        }
        let _ = session.mark_notification_emailed(notification.id, now);
    }
}

// ============================================================================
// SECTION: Expiry Sweeper
// ============================================================================

/// Runs the expiry sweeper until shutdown.
///
/// The sweep expires documents past their expiry date (emitting a
/// `document_expired` notification each) and archives delivered shipments
/// past their tenant's quiescence window.
pub async fn run_expiry_sweeper(
    store: Arc<SqliteDataStore>,
    bus: Arc<NotificationBus>,
    settings_cache: Arc<TenantSettingsCache>,
    clock: Arc<dyn Clock>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(SWEEP_TICK);
    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
        sweep_once(&store, &bus, &settings_cache, clock.as_ref());
    }
}

/// One sweep iteration; errors abort the iteration, never the worker.
fn sweep_once(
    store: &SqliteDataStore,
    bus: &NotificationBus,
    settings_cache: &TenantSettingsCache,
    clock: &dyn Clock,
) {
    let session = store.session(SessionScope::worker());
    let now = clock.now();

    if let Ok(expired) = session.expire_documents(now) {
        for document in expired {
            let Some(org) = document.organization_id else {
                continue;
            };
            let stored = session.insert_notification(
                org,
                None,
                NotificationKind::DocumentExpired,
                Some(document.shipment_id),
                &format!("Document {} expired", document.file_name),
                json!({"document_id": document.id}),
                now,
            );
            if let Ok(notification) = stored {
                let _ = bus.publish(&notification);
            }
        }
    }

    let Ok(shipments) = session.list_shipments(usize::MAX) else {
        return;
    };
    for shipment in shipments {
        if shipment.status != ShipmentStatus::Delivered {
            continue;
        }
        let Some(delivered_at) = shipment.delivered_at else {
            continue;
        };
        let Ok(settings) = settings_cache.get_or_load(&session, shipment.organization_id, now)
        else {
            continue;
        };
        let quiescence = i64::from(settings.archive_quiescence_days) * MILLIS_PER_DAY;
        if now >= delivered_at.plus_millis(quiescence)
            && session.archive_shipment(shipment.id, now).is_ok()
        {
            let stored = session.insert_notification(
                shipment.organization_id,
                None,
                NotificationKind::ShipmentArchived,
                Some(shipment.id),
                &format!("Shipment {} archived after quiescence", shipment.reference),
                json!({"reference": shipment.reference}),
                now,
            );
            if let Ok(notification) = stored {
                let _ = bus.publish(&notification);
            }
        }
    }
}
