// tracehub-core/src/lib.rs
// ============================================================================
// Module: TraceHub Core Library
// Description: Public API surface for the Compliance & Shipment Engine core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! `tracehub-core` provides the deterministic heart of TraceHub: the
//! tenant-scoped data model, the document and shipment lifecycle tables, the
//! compliance matrix, the rules engine, and Bill-of-Lading enrichment. It is
//! backend-agnostic and integrates through explicit interfaces rather than
//! embedding driver details.
//!
//! The core is pure: it never reads wall-clock time, never performs I/O, and
//! produces identical outputs for identical inputs. Hosts supply timestamps
//! and drivers at the edges.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::BlobError;
pub use interfaces::BlobKey;
pub use interfaces::BlobStore;
pub use interfaces::CarrierClient;
pub use interfaces::CarrierError;
pub use interfaces::ClassifiedDocument;
pub use interfaces::ClassifierError;
pub use interfaces::Clock;
pub use interfaces::DocumentClassifier;
pub use interfaces::FixedClock;
pub use interfaces::MailError;
pub use interfaces::Mailer;
pub use interfaces::MessageId;
pub use interfaces::Notifier;
pub use interfaces::NotifyError;
pub use interfaces::SignedUrl;
pub use interfaces::StoreError;
pub use interfaces::SystemClock;
pub use runtime::cross_doc::CROSS_DOC_RULES;
pub use runtime::cross_doc::WEIGHT_TOLERANCE_RATIO;
pub use runtime::document_flow::DocumentEvent;
pub use runtime::document_flow::DocumentFlow;
pub use runtime::document_flow::DocumentFlowError;
pub use runtime::engine::Decision;
pub use runtime::engine::EvaluationInput;
pub use runtime::engine::EvaluationReport;
pub use runtime::engine::RulesEngine;
pub use runtime::engine::aggregate;
pub use runtime::enrichment::EnrichmentOutcome;
pub use runtime::enrichment::enrich_from_bol;
pub use runtime::enrichment::extract_unlocode;
pub use runtime::eudr::EUDR_RULES;
pub use runtime::matrix::ComplianceMatrix;
pub use runtime::matrix::EUDR_HS_PREFIXES;
pub use runtime::matrix::EUDR_PRODUCTION_CUTOFF_MILLIS;
pub use runtime::matrix::HORN_HOOF_HS_PREFIXES;
pub use runtime::matrix::MatrixEntry;
pub use runtime::matrix::ValidationExpectation;
pub use runtime::matrix::eudr_applicable;
pub use runtime::matrix::is_horn_hoof;
pub use runtime::rules::BOL_RULES;
pub use runtime::rules::RuleContext;
pub use runtime::rules::RuleDef;
pub use runtime::rules::RuleResult;
pub use runtime::rules::is_missing_or_placeholder;
pub use runtime::rules::is_placeholder;
pub use runtime::shipment_flow::ShipmentEvent;
pub use runtime::shipment_flow::ShipmentFlow;
pub use runtime::shipment_flow::ShipmentFlowError;
