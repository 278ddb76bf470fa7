// tracehub-core/src/runtime/shipment_flow.rs
// ============================================================================
// Module: TraceHub Shipment Lifecycle
// Description: Static transition table for the shipment state machine.
// Purpose: Derive shipment status from documents and carrier events.
// Dependencies: crate::core::{shipment, tracking}, serde, thiserror
// ============================================================================

//! ## Overview
//! Shipment lifecycle transitions are encoded as a static table driven by two
//! inputs: document completeness and normalized carrier events. Status only
//! ever advances; a carrier event that would map to an earlier status is
//! persisted for audit but produces no transition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::shipment::ShipmentStatus;
use crate::core::tracking::EventStatus;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Shipment lifecycle event.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentEvent {
    /// First document uploaded.
    DocumentUploaded,
    /// Every required document present and compliant.
    RequiredDocsComplete,
    /// Normalized carrier event ingested.
    Carrier(EventStatus),
    /// Tenant quiescence period elapsed after delivery.
    QuiescenceElapsed,
    /// Administrator archived the shipment explicitly.
    AdminArchive,
    /// System administrator reversed an archive.
    AdminUnarchive,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Shipment lifecycle errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShipmentFlowError {
    /// The `(from, event)` pair is not legal.
    #[error("invalid shipment transition: {from} on {event}")]
    InvalidTransition {
        /// Status the shipment was in.
        from: &'static str,
        /// Event label that was applied.
        event: String,
    },
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Shipment lifecycle executor.
pub struct ShipmentFlow;

impl ShipmentFlow {
    /// Applies a non-carrier event to a status, returning the successor.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentFlowError::InvalidTransition`] when the pair is not
    /// legal.
    pub fn apply(
        from: ShipmentStatus,
        event: ShipmentEvent,
    ) -> Result<ShipmentStatus, ShipmentFlowError> {
        let to = match (from, event) {
            (ShipmentStatus::Draft, ShipmentEvent::DocumentUploaded) => {
                Some(ShipmentStatus::DocsPending)
            }
            (ShipmentStatus::DocsPending, ShipmentEvent::RequiredDocsComplete) => {
                Some(ShipmentStatus::DocsComplete)
            }
            (ShipmentStatus::Delivered, ShipmentEvent::QuiescenceElapsed) => {
                Some(ShipmentStatus::Archived)
            }
            (ShipmentStatus::Delivered, ShipmentEvent::AdminArchive) => {
                Some(ShipmentStatus::Archived)
            }
            (ShipmentStatus::Archived, ShipmentEvent::AdminUnarchive) => {
                Some(ShipmentStatus::Delivered)
            }
            (_, ShipmentEvent::Carrier(status)) => {
                return Self::advance_on_carrier(from, status, false).ok_or_else(|| {
                    ShipmentFlowError::InvalidTransition {
                        from: from.as_str(),
                        event: format!("carrier:{}", status.as_str()),
                    }
                });
            }
            _ => None,
        };
        to.ok_or_else(|| ShipmentFlowError::InvalidTransition {
            from: from.as_str(),
            event: event_label(event),
        })
    }

    /// Advances the status on a carrier event, or returns `None` when the
    /// event produces no transition (stale, irrelevant, or regressive).
    ///
    /// `customs_released_seen` reports whether a `customs_released` event was
    /// already ingested for the shipment; a later `gate_out` then completes
    /// delivery.
    #[must_use]
    pub fn advance_on_carrier(
        from: ShipmentStatus,
        event: EventStatus,
        customs_released_seen: bool,
    ) -> Option<ShipmentStatus> {
        match (from, event) {
            (
                ShipmentStatus::DocsComplete,
                EventStatus::Departed | EventStatus::InTransit,
            ) => Some(ShipmentStatus::InTransit),
            (
                ShipmentStatus::InTransit,
                EventStatus::Arrived | EventStatus::Discharged,
            ) => Some(ShipmentStatus::Arrived),
            (ShipmentStatus::Arrived, EventStatus::CustomsHold) => Some(ShipmentStatus::Customs),
            (
                ShipmentStatus::Arrived | ShipmentStatus::Customs,
                EventStatus::Delivered,
            ) => Some(ShipmentStatus::Delivered),
            (ShipmentStatus::Customs, EventStatus::GateOut) if customs_released_seen => {
                Some(ShipmentStatus::Delivered)
            }
            _ => None,
        }
    }

    /// Returns true when a status never regresses past the candidate.
    ///
    /// Used by ingestion to persist stale events without transitioning.
    #[must_use]
    pub fn is_regression(from: ShipmentStatus, candidate: ShipmentStatus) -> bool {
        candidate < from
    }

    /// Derives the status from the complete document and event history.
    ///
    /// Both the document path and the event path converge through this
    /// function after every mutation, so the final status is independent of
    /// the interleaving in which documents and events arrived. `events` must
    /// be ordered by event time.
    #[must_use]
    pub fn derive(
        documents_uploaded: bool,
        required_docs_complete: bool,
        events: &[EventStatus],
    ) -> ShipmentStatus {
        let mut status = ShipmentStatus::Draft;
        if documents_uploaded {
            status = ShipmentStatus::DocsPending;
        }
        if !required_docs_complete {
            return status;
        }
        status = ShipmentStatus::DocsComplete;
        let mut customs_released = false;
        for event in events {
            if *event == EventStatus::CustomsReleased {
                customs_released = true;
            }
            if let Some(next) = Self::advance_on_carrier(status, *event, customs_released) {
                status = next;
            }
        }
        status
    }
}

/// Returns a stable label for an event.
fn event_label(event: ShipmentEvent) -> String {
    match event {
        ShipmentEvent::DocumentUploaded => "document_uploaded".to_string(),
        ShipmentEvent::RequiredDocsComplete => "required_docs_complete".to_string(),
        ShipmentEvent::Carrier(status) => format!("carrier:{}", status.as_str()),
        ShipmentEvent::QuiescenceElapsed => "quiescence_elapsed".to_string(),
        ShipmentEvent::AdminArchive => "admin_archive".to_string(),
        ShipmentEvent::AdminUnarchive => "admin_unarchive".to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
