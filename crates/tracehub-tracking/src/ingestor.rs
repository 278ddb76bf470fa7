// tracehub-tracking/src/ingestor.rs
// ============================================================================
// Module: Tracking Ingestor
// Description: Scheduled carrier polling with a fixed worker pool.
// Purpose: Ingest events, advance shipments, and publish notifications.
// Dependencies: tokio, tracehub-config, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! The ingestor scans pollable shipments on a scheduler tick, polls each due
//! shipment on its state-dependent interval, and ingests normalized events
//! under the shipment's advisory lock. The carrier fetch happens before the
//! lock is taken; no lock is ever held across external I/O. A failing
//! shipment never blocks the pool: every poll is wrapped in a recover
//! boundary that records the error and moves on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracehub_config::PollIntervals;
use tracehub_config::WorkerConfig;
use tracehub_core::ComplianceMatrix;
use tracehub_core::NotificationKind;
use tracehub_core::Shipment;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::CarrierClient;
use tracehub_core::interfaces::CarrierError;
use tracehub_core::interfaces::Clock;
use tracehub_core::interfaces::Notifier;
use tracehub_core::interfaces::StoreError;
use tracehub_store_sqlite::SessionScope;
use tracehub_store_sqlite::SqliteDataStore;

use crate::backoff::BackoffSchedule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Scheduler tick between due-shipment scans.
const SCHEDULER_TICK: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Ingestor counters for observability.
///
/// # Invariants
/// - Counters only increase; hosts snapshot and diff.
#[derive(Debug, Default)]
pub struct IngestorMetrics {
    /// Polls attempted.
    pub polls: AtomicU64,
    /// Events inserted after dedup.
    pub events_inserted: AtomicU64,
    /// Shipment lifecycle transitions applied.
    pub transitions: AtomicU64,
    /// Transient carrier failures retried.
    pub transient_failures: AtomicU64,
    /// Permanent carrier failures (polling suspended).
    pub permanent_failures: AtomicU64,
    /// Iterations recovered by the boundary.
    pub iteration_errors: AtomicU64,
}

// ============================================================================
// SECTION: Poll Outcome
// ============================================================================

/// Outcome of one shipment poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Events ingested (possibly zero after dedup).
    Ingested {
        /// Rows inserted after dedup.
        inserted: usize,
        /// Lifecycle transition applied, if any.
        transition: Option<(ShipmentStatus, ShipmentStatus)>,
    },
    /// Carrier rejected the container; polling suspended.
    Suspended,
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Background tracking ingestor.
pub struct Ingestor {
    /// Backing store.
    store: Arc<SqliteDataStore>,
    /// Carrier adapter.
    carrier: Arc<dyn CarrierClient>,
    /// Notification publisher.
    notifier: Arc<dyn Notifier>,
    /// Wall clock seam.
    clock: Arc<dyn Clock>,
    /// Compliance matrix snapshot.
    matrix: Arc<ComplianceMatrix>,
    /// Per-state poll intervals.
    intervals: PollIntervals,
    /// Worker pool configuration.
    workers: WorkerConfig,
    /// Counters.
    metrics: Arc<IngestorMetrics>,
}

impl Ingestor {
    /// Builds an ingestor over the given drivers.
    #[must_use]
    pub fn new(
        store: Arc<SqliteDataStore>,
        carrier: Arc<dyn CarrierClient>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        matrix: Arc<ComplianceMatrix>,
        intervals: PollIntervals,
        workers: WorkerConfig,
    ) -> Self {
        Self {
            store,
            carrier,
            notifier,
            clock,
            matrix,
            intervals,
            workers,
            metrics: Arc::new(IngestorMetrics::default()),
        }
    }

    /// Returns the shared metrics handle.
    #[must_use]
    pub fn metrics(&self) -> Arc<IngestorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the poll interval for a shipment state.
    #[must_use]
    pub const fn poll_interval_for(&self, status: ShipmentStatus) -> Duration {
        let secs = match status {
            ShipmentStatus::InTransit => self.intervals.in_transit_secs,
            ShipmentStatus::Arrived => self.intervals.arrived_secs,
            ShipmentStatus::Customs => self.intervals.customs_secs,
            _ => self.intervals.docs_complete_secs,
        };
        Duration::from_secs(secs)
    }

    /// Polls one shipment synchronously (runs on a blocking worker thread).
    ///
    /// The carrier fetch (with retries) completes before the advisory lock
    /// is taken; the lock covers only the dedup insert and the status
    /// recompute.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails; carrier failures are
    /// absorbed into the outcome.
    pub fn poll_shipment(&self, shipment: &Shipment) -> Result<PollOutcome, StoreError> {
        self.metrics.polls.fetch_add(1, Ordering::Relaxed);
        let session = self.store.session(SessionScope::worker());
        let container = shipment
            .container_number
            .as_deref()
            .ok_or_else(|| StoreError::Invalid("shipment has no container number".to_string()))?;
        let since = session.latest_event_time(shipment.id)?;

        let schedule = BackoffSchedule::from_millis(
            self.workers.backoff_base_ms,
            self.workers.backoff_cap_ms,
            self.workers.max_retries,
        );
        let mut attempt = 0u32;
        let events = loop {
            match self.carrier.fetch_events(container, since) {
                Ok(events) => break events,
                Err(CarrierError::Transient(message)) => {
                    self.metrics.transient_failures.fetch_add(1, Ordering::Relaxed);
                    attempt += 1;
                    if attempt >= schedule.max_attempts() {
                        return Err(StoreError::Io(format!(
                            "carrier still failing after {attempt} attempts: {message}"
                        )));
                    }
                    std::thread::sleep(schedule.jittered_delay_for(attempt - 1));
                }
                Err(CarrierError::Permanent(message)) => {
                    self.metrics.permanent_failures.fetch_add(1, Ordering::Relaxed);
                    let now = self.clock.now();
                    session.set_tracking_error(shipment.id, &message, now)?;
                    self.publish(
                        &session,
                        shipment,
                        NotificationKind::TrackingSuspended,
                        &format!(
                            "Tracking suspended for {}: {message}",
                            shipment.reference
                        ),
                        now,
                    );
                    return Ok(PollOutcome::Suspended);
                }
            }
        };

        let now = self.clock.now();
        let (inserted, change) = self.store.with_shipment_lock(shipment.id, || {
            let inserted = session.insert_events_dedup(shipment.id, &events, now)?;
            let change = if inserted.is_empty() {
                None
            } else {
                session.recompute_shipment_status(shipment.id, &self.matrix, now)?
            };
            Ok((inserted.len(), change))
        })?;

        self.metrics
            .events_inserted
            .fetch_add(u64::try_from(inserted).unwrap_or(0), Ordering::Relaxed);

        let transition = change.map(|change| (change.previous, change.current));
        if let Some(change) = change {
            self.metrics.transitions.fetch_add(1, Ordering::Relaxed);
            if let Some(kind) = notification_for(change.current) {
                self.publish(
                    &session,
                    shipment,
                    kind,
                    &format!("Shipment {} is now {}", shipment.reference, change.current.as_str()),
                    now,
                );
            }
        }

        Ok(PollOutcome::Ingested {
            inserted,
            transition,
        })
    }

    /// Persists and publishes a notification, absorbing publish failures.
    fn publish(
        &self,
        session: &tracehub_store_sqlite::TenantSession<'_>,
        shipment: &Shipment,
        kind: NotificationKind,
        message: &str,
        now: Timestamp,
    ) {
        let stored = session.insert_notification(
            shipment.organization_id,
            None,
            kind,
            Some(shipment.id),
            message,
            json!({"reference": shipment.reference, "status": shipment.status.as_str()}),
            now,
        );
        match stored {
            Ok(notification) => {
                if self.notifier.publish(&notification).is_err() {
                    self.metrics.iteration_errors.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(_) => {
                self.metrics.iteration_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Runs the scheduler loop until shutdown, then drains in-flight work.
    ///
    /// Each due shipment is polled on the worker pool; a failing poll
    /// increments a counter and never stops the loop.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let semaphore = Arc::new(Semaphore::new(self.workers.pool_size));
        let mut join_set: JoinSet<()> = JoinSet::new();
        let mut next_due: HashMap<ShipmentId, Timestamp> = HashMap::new();
        let mut tick = tokio::time::interval(SCHEDULER_TICK);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }

            while join_set.try_join_next().is_some() {}

            let shipments = {
                let session = self.store.session(SessionScope::worker());
                match session.pollable_shipments() {
                    Ok(shipments) => shipments,
                    Err(_) => {
                        self.metrics.iteration_errors.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                }
            };
            let now = self.clock.now();
            for shipment in shipments {
                let due = next_due
                    .get(&shipment.id)
                    .copied()
                    .is_none_or(|due| now >= due);
                if !due {
                    continue;
                }
                let interval = self.poll_interval_for(shipment.status);
                next_due.insert(
                    shipment.id,
                    now.plus_millis(i64::try_from(interval.as_millis()).unwrap_or(i64::MAX)),
                );

                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let ingestor = Arc::clone(&self);
                join_set.spawn(async move {
                    let _permit = permit;
                    let result = tokio::task::spawn_blocking(move || {
                        let outcome = ingestor.poll_shipment(&shipment);
                        (ingestor, outcome)
                    })
                    .await;
                    if let Ok((ingestor, outcome)) = result {
                        if outcome.is_err() {
                            ingestor.metrics.iteration_errors.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        }

        // Drain in-flight polls, bounded by the shutdown grace period.
        let grace = Duration::from_millis(self.workers.shutdown_grace_ms);
        let _ = tokio::time::timeout(grace, async {
            while join_set.join_next().await.is_some() {}
        })
        .await;
        join_set.abort_all();
    }
}

// ============================================================================
// SECTION: Notification Mapping
// ============================================================================

/// Maps a new shipment status to its notification kind.
const fn notification_for(status: ShipmentStatus) -> Option<NotificationKind> {
    match status {
        ShipmentStatus::DocsComplete => Some(NotificationKind::ShipmentDocsComplete),
        ShipmentStatus::InTransit => Some(NotificationKind::ShipmentDeparted),
        ShipmentStatus::Arrived => Some(NotificationKind::ShipmentArrived),
        ShipmentStatus::Customs => Some(NotificationKind::ShipmentCustomsHold),
        ShipmentStatus::Delivered => Some(NotificationKind::ShipmentDelivered),
        ShipmentStatus::Archived => Some(NotificationKind::ShipmentArchived),
        ShipmentStatus::Draft | ShipmentStatus::DocsPending => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
