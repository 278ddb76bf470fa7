// tracehub-core/src/core/tracking.rs
// ============================================================================
// Module: TraceHub Container Events
// Description: Normalized carrier events and persisted container history.
// Purpose: Model tracking ingestion records and their deduplication key.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Carrier adapters normalize provider payloads into [`NormalizedEvent`]
//! values; the ingestor persists them as [`ContainerEvent`] rows. Events are
//! deduplicated on `(shipment_id, event_status, event_time, source)` with a
//! 60-second time tolerance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::EventId;
use crate::core::identifiers::ShipmentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Dedup time tolerance in milliseconds (60 seconds).
pub const EVENT_DEDUP_TOLERANCE_MILLIS: u64 = 60_000;

// ============================================================================
// SECTION: Event Status
// ============================================================================

/// Normalized container event status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Booking confirmed.
    Booked,
    /// Container gated in at origin terminal.
    GateIn,
    /// Container loaded on vessel.
    Loaded,
    /// Vessel departed the port of loading.
    Departed,
    /// Vessel underway.
    InTransit,
    /// Container transshipped at an intermediate port.
    Transshipment,
    /// Vessel arrived at the port of discharge.
    Arrived,
    /// Container discharged from vessel.
    Discharged,
    /// Container held by customs.
    CustomsHold,
    /// Customs released the container.
    CustomsReleased,
    /// Container gated out of the terminal.
    GateOut,
    /// Container delivered to the consignee.
    Delivered,
    /// Any other carrier status.
    Other,
}

impl EventStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::GateIn => "gate_in",
            Self::Loaded => "loaded",
            Self::Departed => "departed",
            Self::InTransit => "in_transit",
            Self::Transshipment => "transshipment",
            Self::Arrived => "arrived",
            Self::Discharged => "discharged",
            Self::CustomsHold => "customs_hold",
            Self::CustomsReleased => "customs_released",
            Self::GateOut => "gate_out",
            Self::Delivered => "delivered",
            Self::Other => "other",
        }
    }
}

// ============================================================================
// SECTION: Event Source
// ============================================================================

/// Origin of a container event.
///
/// # Invariants
/// - The label participates in the dedup key; it must be stable per provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSource(String);

impl EventSource {
    /// Creates a new event source label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the source label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Event normalized by a carrier adapter, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Normalized status.
    pub status: EventStatus,
    /// Event timestamp.
    pub event_time: Timestamp,
    /// UN/LOCODE of the event location when known.
    pub location_code: Option<String>,
    /// Display name of the event location.
    pub location_name: Option<String>,
    /// Vessel name when stated.
    pub vessel: Option<String>,
    /// Voyage number when stated.
    pub voyage: Option<String>,
    /// Source provider label.
    pub source: EventSource,
    /// Raw provider payload kept for audit.
    pub raw_payload: Option<Value>,
}

/// Persisted container event.
///
/// # Invariants
/// - `(shipment_id, event_status, event_time, source)` is unique with a
///   60-second tolerance on `event_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerEvent {
    /// Event identifier.
    pub id: EventId,
    /// Parent shipment.
    pub shipment_id: ShipmentId,
    /// Normalized status.
    pub event_status: EventStatus,
    /// Event timestamp.
    pub event_time: Timestamp,
    /// UN/LOCODE of the event location when known.
    pub location_code: Option<String>,
    /// Display name of the event location.
    pub location_name: Option<String>,
    /// Vessel name when stated.
    pub vessel: Option<String>,
    /// Voyage number when stated.
    pub voyage: Option<String>,
    /// Source provider label.
    pub source: EventSource,
    /// Raw provider payload kept for audit.
    pub raw_payload: Option<Value>,
    /// Ingestion timestamp.
    pub ingested_at: Timestamp,
}

impl ContainerEvent {
    /// Returns true when `candidate` duplicates this event under the dedup key.
    #[must_use]
    pub fn duplicates(&self, candidate: &NormalizedEvent) -> bool {
        self.event_status == candidate.status
            && self.source == candidate.source
            && self.event_time.abs_diff_millis(candidate.event_time) <= EVENT_DEDUP_TOLERANCE_MILLIS
    }
}
