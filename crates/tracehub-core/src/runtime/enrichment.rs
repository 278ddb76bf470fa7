// tracehub-core/src/runtime/enrichment.rs
// ============================================================================
// Module: TraceHub BoL Enrichment
// Description: Authoritative back-fill of shipment columns from a parsed BoL.
// Purpose: Keep shipment routing data consistent with its Bill of Lading.
// Dependencies: crate::core::{document, shipment}, crate::runtime::rules
// ============================================================================

//! ## Overview
//! A parsed Bill of Lading is authoritative for the parent shipment: the B/L
//! number is always overwritten, the container number only when the current
//! value is empty or a placeholder, and the remaining routing columns only
//! when currently empty. After enrichment the caller enqueues a rules engine
//! re-evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::document::ParsedBol;
use crate::core::shipment::Shipment;
use crate::runtime::rules::is_placeholder;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Fields rewritten by one enrichment pass.
///
/// # Invariants
/// - `changed_fields` lists column names in a fixed evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct EnrichmentOutcome {
    /// Shipment columns that were rewritten.
    pub changed_fields: Vec<&'static str>,
}

impl EnrichmentOutcome {
    /// Returns true when any column changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.changed_fields.is_empty()
    }
}

// ============================================================================
// SECTION: UN/LOCODE Extraction
// ============================================================================

/// Extracts the UN/LOCODE from a free-form port string.
///
/// Returns the first uppercase 5-letter token when present (e.g. `NGAPP`
/// from `"Apapa (NGAPP)"`), otherwise `None`.
#[must_use]
pub fn extract_unlocode(port: &str) -> Option<String> {
    port.split(|c: char| !c.is_ascii_alphabetic())
        .find(|token| token.len() == 5 && token.bytes().all(|b| b.is_ascii_uppercase()))
        .map(ToString::to_string)
}

// ============================================================================
// SECTION: Enrichment
// ============================================================================

/// Returns true when a column value counts as empty for enrichment.
fn column_is_empty(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Back-fills shipment columns from a parsed Bill of Lading.
///
/// Overwrite policy:
/// - `bl_number` is always overwritten.
/// - `container_number` is overwritten only when currently empty or a
///   detected placeholder.
/// - `vessel`, `voyage`, `pol_code`, `pod_code`, and `atd` are overwritten
///   only when currently empty.
pub fn enrich_from_bol(shipment: &mut Shipment, parsed: &ParsedBol) -> EnrichmentOutcome {
    let mut outcome = EnrichmentOutcome::default();

    if let Some(bol_number) = parsed.bol_number.as_deref() {
        if shipment.bl_number.as_deref() != Some(bol_number) {
            shipment.bl_number = Some(bol_number.to_string());
            outcome.changed_fields.push("bl_number");
        }
    }

    if let Some(container) = parsed.containers.first() {
        let replace = shipment
            .container_number
            .as_deref()
            .is_none_or(|current| current.trim().is_empty() || is_placeholder(current));
        if replace && shipment.container_number.as_deref() != Some(container.as_str()) {
            shipment.container_number = Some(container.clone());
            outcome.changed_fields.push("container_number");
        }
    }

    if column_is_empty(shipment.vessel.as_deref()) {
        if let Some(vessel) = parsed.vessel.as_deref() {
            shipment.vessel = Some(vessel.to_string());
            outcome.changed_fields.push("vessel");
        }
    }

    if column_is_empty(shipment.voyage.as_deref()) {
        if let Some(voyage) = parsed.voyage.as_deref() {
            shipment.voyage = Some(voyage.to_string());
            outcome.changed_fields.push("voyage");
        }
    }

    if column_is_empty(shipment.pol_code.as_deref()) {
        if let Some(code) = parsed.port_of_loading.as_deref().and_then(extract_unlocode) {
            shipment.pol_code = Some(code);
            outcome.changed_fields.push("pol_code");
        }
    }

    if column_is_empty(shipment.pod_code.as_deref()) {
        if let Some(code) = parsed.port_of_discharge.as_deref().and_then(extract_unlocode) {
            shipment.pod_code = Some(code);
            outcome.changed_fields.push("pod_code");
        }
    }

    if shipment.atd.is_none() {
        if let Some(shipped) = parsed.shipped_on_board {
            shipment.atd = Some(shipped);
            outcome.changed_fields.push("atd");
        }
    }

    outcome
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
