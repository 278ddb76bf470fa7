// tracehub-api/src/handlers/tracking.rs
// ============================================================================
// Module: Tracking Handlers
// Description: Event history, manual ingestion, and poll resumption.
// Purpose: Expose the container tracking surface.
// Dependencies: axum, tracehub-core, tracehub-store-sqlite
// ============================================================================

//! ## Overview
//! The event history is readable by every tenant with shipment visibility.
//! Manual ingestion accepts normalized events through the same dedup and
//! derivation path the background ingestor uses. Resumption clears a
//! carrier permanent-failure marker after operator action.

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
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracehub_core::ContainerEvent;
use tracehub_core::EventSource;
use tracehub_core::EventStatus;
use tracehub_core::NormalizedEvent;
use tracehub_core::NotificationKind;
use tracehub_core::Permission;
use tracehub_core::ResourceKind;
use tracehub_core::ShipmentId;
use tracehub_core::ShipmentStatus;
use tracehub_core::Timestamp;
use tracehub_core::interfaces::Notifier;

use crate::context::require;
use crate::error::ApiError;
use crate::handlers::begin;
use crate::handlers::map_store_err;
use crate::handlers::session_for;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// One manually ingested event.
#[derive(Debug, Deserialize)]
pub struct ManualEvent {
    /// Normalized status.
    pub status: EventStatus,
    /// Event timestamp.
    pub event_time: Timestamp,
    /// UN/LOCODE when known.
    #[serde(default)]
    pub location_code: Option<String>,
    /// Location display name.
    #[serde(default)]
    pub location_name: Option<String>,
    /// Vessel name.
    #[serde(default)]
    pub vessel: Option<String>,
    /// Voyage number.
    #[serde(default)]
    pub voyage: Option<String>,
}

/// `POST /tracking/{shipment_id}/events` request body.
#[derive(Debug, Deserialize)]
pub struct IngestEventsRequest {
    /// Events to ingest.
    pub events: Vec<ManualEvent>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Parses a shipment path id.
fn shipment_id(raw: u64) -> Result<ShipmentId, ApiError> {
    ShipmentId::from_raw(raw).ok_or_else(|| ApiError::validation("invalid shipment id"))
}

/// `GET /tracking/{shipment_id}/events` — event history in time order.
pub async fn events(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<Json<Vec<ContainerEvent>>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    let session = session_for(&state, &ctx);
    let events = session
        .events_for_shipment(shipment_id(raw)?)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(Json(events))
}

/// `POST /tracking/{shipment_id}/events` — manual event ingestion.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
    Json(body): Json<IngestEventsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::TrackingManage, ResourceKind::Tracking)?;
    let id = shipment_id(raw)?;
    let session = session_for(&state, &ctx);
    session
        .require_shipment_write(id)
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    let normalized: Vec<NormalizedEvent> = body
        .events
        .into_iter()
        .map(|event| NormalizedEvent {
            status: event.status,
            event_time: event.event_time,
            location_code: event.location_code,
            location_name: event.location_name,
            vessel: event.vessel,
            voyage: event.voyage,
            source: EventSource::new("manual"),
            raw_payload: None,
        })
        .collect();

    let (inserted, change) = state
        .store
        .with_shipment_lock(id, || {
            let inserted = session.insert_events_dedup(id, &normalized, ctx.now)?;
            let change = if inserted.is_empty() {
                None
            } else {
                session.recompute_shipment_status(id, &state.matrix, ctx.now)?
            };
            Ok((inserted.len(), change))
        })
        .map_err(|err| map_store_err(&state, &ctx, err))?;

    if let Some(change) = change {
        let shipment =
            session.get_shipment(id).map_err(|err| map_store_err(&state, &ctx, err))?;
        let kind = match change.current {
            ShipmentStatus::InTransit => Some(NotificationKind::ShipmentDeparted),
            ShipmentStatus::Arrived => Some(NotificationKind::ShipmentArrived),
            ShipmentStatus::Customs => Some(NotificationKind::ShipmentCustomsHold),
            ShipmentStatus::Delivered => Some(NotificationKind::ShipmentDelivered),
            _ => None,
        };
        if let Some(kind) = kind {
            let stored = session.insert_notification(
                shipment.organization_id,
                None,
                kind,
                Some(id),
                &format!("Shipment {} is now {}", shipment.reference, change.current.as_str()),
                json!({"previous": change.previous.as_str()}),
                ctx.now,
            );
            if let Ok(notification) = stored {
                let _ = state.bus.publish(&notification);
            }
        }
    }

    Ok(Json(json!({
        "inserted": inserted,
        "transition": change.map(|c| json!({
            "previous": c.previous.as_str(),
            "current": c.current.as_str(),
        })),
        "request_id": ctx.request_id,
    })))
}

/// `POST /tracking/{shipment_id}/resume` — clears a permanent failure.
pub async fn resume(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let ctx = begin(&state, &headers, peer)?;
    require(&state, &ctx, Permission::TrackingManage, ResourceKind::Tracking)?;
    let session = session_for(&state, &ctx);
    session
        .clear_tracking_error(shipment_id(raw)?, ctx.now)
        .map_err(|err| map_store_err(&state, &ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}
