// tracehub-store-sqlite/src/tracking.rs
// ============================================================================
// Module: Container Event Persistence
// Description: Deduplicated event inserts and event history reads.
// Purpose: Enforce the tracking dedup key inside one transaction.
// Dependencies: crate::store, rusqlite, tracehub-core
// ============================================================================

//! ## Overview
//! Incoming normalized events are deduplicated against existing rows on
//! `(shipment_id, event_status, event_time, source)` with a 60-second time
//! tolerance, then inserted in one transaction. Stale events are persisted
//! for audit even when they produce no lifecycle transition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;
use serde_json::json;
use tracehub_core::AuditAction;
use tracehub_core::ContainerEvent;
use tracehub_core::EVENT_DEDUP_TOLERANCE_MILLIS;
use tracehub_core::EventId;
use tracehub_core::NormalizedEvent;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::StoreError;

use crate::store::TenantSession;
use crate::store::from_json;
use crate::store::id_to_i64;
use crate::store::org_to_i64;
use crate::store::to_json;

// ============================================================================
// SECTION: Event Persistence
// ============================================================================

impl TenantSession<'_> {
    /// Inserts normalized events, skipping duplicates under the dedup key.
    ///
    /// Returns the events that were actually inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query or write failure.
    pub fn insert_events_dedup(
        &self,
        shipment_id: ShipmentId,
        incoming: &[NormalizedEvent],
        now: Timestamp,
    ) -> Result<Vec<ContainerEvent>, StoreError> {
        let shipment = self.get_shipment(shipment_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let mut inserted = Vec::new();
        for event in incoming {
            let tolerance = i64::try_from(EVENT_DEDUP_TOLERANCE_MILLIS).unwrap_or(i64::MAX);
            let duplicate: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM container_events
                     WHERE shipment_id = ?1 AND event_status = ?2 AND source = ?3
                       AND event_time BETWEEN ?4 AND ?5",
                    params![
                        id_to_i64(shipment_id.get()),
                        event.status.as_str(),
                        event.source.as_str(),
                        event.event_time.unix_millis() - tolerance,
                        event.event_time.unix_millis() + tolerance
                    ],
                    |row| row.get(0),
                )
                .map_err(|err| StoreError::Io(err.to_string()))?;
            if duplicate > 0 {
                continue;
            }
            // Duplicates inside one batch collapse too.
            if inserted.iter().any(|existing: &ContainerEvent| existing.duplicates(event)) {
                continue;
            }
            let id = self.next_id(&tx, "container_events")?;
            let record = ContainerEvent {
                id: EventId::from_raw(id)
                    .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
                shipment_id,
                event_status: event.status,
                event_time: event.event_time,
                location_code: event.location_code.clone(),
                location_name: event.location_name.clone(),
                vessel: event.vessel.clone(),
                voyage: event.voyage.clone(),
                source: event.source.clone(),
                raw_payload: event.raw_payload.clone(),
                ingested_at: now,
            };
            tx.execute(
                "INSERT INTO container_events
                     (id, shipment_id, organization_id, event_status, event_time, source,
                      record_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id_to_i64(id),
                    id_to_i64(shipment_id.get()),
                    org_to_i64(shipment.organization_id),
                    record.event_status.as_str(),
                    record.event_time.unix_millis(),
                    record.source.as_str(),
                    to_json(&record)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
            inserted.push(record);
        }
        if !inserted.is_empty() {
            self.append_audit_tx(
                &tx,
                now,
                AuditAction::Create,
                "container_event",
                Some(shipment_id.to_string()),
                json!({"inserted": inserted.len()}),
            )?;
        }
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(inserted)
    }

    /// Lists the event history of a visible shipment in event-time order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn events_for_shipment(
        &self,
        shipment_id: ShipmentId,
    ) -> Result<Vec<ContainerEvent>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM container_events
                 WHERE shipment_id = ?1
                 ORDER BY event_time, id",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![id_to_i64(shipment_id.get())], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut events = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            events.push(from_json(&json)?);
        }
        Ok(events)
    }

    /// Returns the most recent event time for a shipment, if any.
    ///
    /// Used by the ingestor as the `since` cursor for carrier fetches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn latest_event_time(
        &self,
        shipment_id: ShipmentId,
    ) -> Result<Option<Timestamp>, StoreError> {
        self.get_shipment(shipment_id)?;
        let conn = self.lock_conn()?;
        let max: Option<i64> = conn
            .query_row(
                "SELECT MAX(event_time) FROM container_events WHERE shipment_id = ?1",
                params![id_to_i64(shipment_id.get())],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(max.map(Timestamp::from_unix_millis))
    }
}
