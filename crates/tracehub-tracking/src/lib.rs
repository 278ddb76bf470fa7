// tracehub-tracking/src/lib.rs
// ============================================================================
// Module: TraceHub Tracking Library
// Description: Background carrier polling and shipment advancement.
// Purpose: Expose the ingestor worker pool and its scheduling model.
// Dependencies: tokio, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! `tracehub-tracking` runs the container-tracking ingestion loop: a fixed
//! worker pool polls the carrier adapter per shipment on state-dependent
//! intervals, deduplicates events, advances the shipment lifecycle, and
//! publishes a notification per transition. Transient carrier failures back
//! off exponentially with jitter; permanent failures suspend polling for the
//! shipment until an operator acts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backoff;
pub mod ingestor;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backoff::BackoffSchedule;
pub use ingestor::Ingestor;
pub use ingestor::IngestorMetrics;
pub use ingestor::PollOutcome;
