// tracehub-api/src/lib.rs
// ============================================================================
// Module: TraceHub API Library
// Description: Public HTTP surface for the Compliance & Shipment Engine.
// Purpose: Expose the router, server, and supporting request plumbing.
// Dependencies: axum, tokio, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! `tracehub-api` exposes the engine over JSON/HTTP: bearer authentication
//! against the external identity provider's verifier contract, tenant
//! context resolution on every call, a uniform error envelope carrying a
//! request identifier, per-caller rate limiting, and the OpenAPI document at
//! `/openapi.json`. Cross-tenant reads surface as 404 to avoid enumeration;
//! cross-tenant writes surface as 403 and emit a security audit event.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod bus;
pub mod cache;
pub mod context;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod ratelimit;
pub mod server;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::TokenClaims;
pub use auth::TokenVerifier;
pub use bus::NotificationBus;
pub use cache::TenantSettingsCache;
pub use error::ApiError;
pub use ratelimit::RateLimiter;
pub use server::build_router;
pub use server::serve;
pub use state::AppState;
