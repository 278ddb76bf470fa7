// tracehub-api/src/handlers/notifications.rs
// ============================================================================
// Module: Notification Handlers
// Description: In-app feed reads, read marks, and preferences.
// Purpose: Expose the notification feed to the frontend.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! The feed reads durable notification rows directly; marking an entry read
//! is idempotent. Preferences gate which event kinds reach which channels
//! and are cached per user by the frontend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use tracehub_core::Notification;
use tracehub_core::NotificationId;
use tracehub_core::NotificationPreferences;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /notifications` — the organization feed, newest first.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::NotificationsRead, ResourceKind::Notification)?;
    let session = session_for(&state, &ctx);
    let notifications =
        session.notification_feed(100).map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(notifications))
}

/// `POST /notifications/{id}/read` — idempotent read mark.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Notification>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let notification_id = NotificationId::from_raw(raw)
        .ok_or_else(|| ApiError::validation("invalid notification id"))?;
    let session = session_for(&state, &ctx);
    let notification = session
        .mark_notification_read(notification_id, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(notification))
}

/// `GET /notifications/preferences` — the caller's channel preferences.
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let preferences = session
        .notification_preferences(ctx.tenant.user_id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(preferences))
}

/// `PUT /notifications/preferences` — replaces the caller's preferences.
pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(preferences): Json<NotificationPreferences>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    session
        .save_notification_preferences(ctx.tenant.user_id, &preferences)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(preferences))
}
