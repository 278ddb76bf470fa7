// tracehub-config/src/lib.rs
// ============================================================================
// Module: TraceHub Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for tracehub.toml and env semantics.
// Dependencies: serde, serde_json, thiserror, toml
// ============================================================================

//! ## Overview
//! `tracehub-config` defines the canonical configuration model for the
//! Compliance & Shipment Engine. It provides strict, fail-closed validation,
//! environment-variable overrides, and a deterministic example generator.
//!
//! Configuration inputs are untrusted: every load path ends in
//! [`TracehubConfig::validate`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
