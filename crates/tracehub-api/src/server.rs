// tracehub-api/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: Router assembly and the serving loop.
// Purpose: Wire handlers, workers, and graceful shutdown together.
// Dependencies: axum, tokio, tracehub-core
// ============================================================================

//! ## Overview
//! The router groups endpoints exactly as the public contract documents
//! them; `/openapi.json` serves the generated document. `serve` binds the
//! listener, spawns the background workers (tracking ingestor, email
//! dispatcher, expiry sweeper), and drains everything on shutdown.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use tokio::sync::watch;

use crate::handlers;
use crate::openapi::openapi_document;
use crate::state::AppState;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the public API router.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/openapi.json", get(serve_openapi))
        .route("/auth/me", get(handlers::auth::me))
        .route("/organizations", post(handlers::organizations::create))
        .route(
            "/organizations/{id}",
            get(handlers::organizations::get).delete(handlers::organizations::suspend),
        )
        .route("/organizations/{id}/settings", put(handlers::organizations::update_settings))
        .route("/invitations", post(handlers::invitations::create))
        .route("/invitations/accept", post(handlers::invitations::accept))
        .route("/invitations/{id}/resend", post(handlers::invitations::resend))
        .route("/invitations/{id}/revoke", post(handlers::invitations::revoke))
        .route("/shipments", post(handlers::shipments::create).get(handlers::shipments::list))
        .route(
            "/shipments/{id}",
            get(handlers::shipments::get).put(handlers::shipments::update),
        )
        .route("/shipments/{id}/products", post(handlers::shipments::add_product))
        .route("/shipments/{id}/origins", post(handlers::shipments::add_origin))
        .route("/shipments/{id}/archive", post(handlers::shipments::archive))
        .route("/shipments/{id}/unarchive", post(handlers::shipments::unarchive))
        .route("/shipments/{id}/documents", get(handlers::documents::list_for_shipment))
        .route("/documents", post(handlers::documents::upload))
        .route("/documents/{id}", get(handlers::documents::get))
        .route("/documents/{id}/validate", post(handlers::documents::validate))
        .route("/documents/{id}/reject", post(handlers::documents::reject))
        .route("/documents/{id}/download", get(handlers::documents::download))
        .route("/tracking/{id}/events", get(handlers::tracking::events).post(handlers::tracking::ingest))
        .route("/tracking/{id}/resume", post(handlers::tracking::resume))
        .route("/compliance/evaluate/{id}", post(handlers::compliance::evaluate))
        .route("/compliance/{id}/issues", get(handlers::compliance::issues))
        .route("/compliance/issues/{id}/override", post(handlers::compliance::override_issue))
        .route("/audit-packs/{id}", get(handlers::audit_packs::assemble_pack))
        .route("/notifications", get(handlers::notifications::feed))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read))
        .route(
            "/notifications/preferences",
            get(handlers::notifications::get_preferences)
                .put(handlers::notifications::put_preferences),
        )
        .with_state(state)
}

/// Serves the generated OpenAPI document.
async fn serve_openapi() -> Json<serde_json::Value> {
    Json(openapi_document())
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Serving errors.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Listener binding failed.
    #[error("bind failed: {0}")]
    Bind(String),
    /// Server I/O failure.
    #[error("serve failed: {0}")]
    Io(String),
}

/// Binds the listener and serves until the shutdown signal fires.
///
/// # Errors
///
/// Returns [`ServeError`] when binding or serving fails.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServeError> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ServeError::Bind(err.to_string()))?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        // Either a true shutdown value or a closed channel stops the server.
        while shutdown.changed().await.is_ok() {
            if *shutdown.borrow() {
                break;
            }
        }
    })
    .await
    .map_err(|err| ServeError::Io(err.to_string()))
}
