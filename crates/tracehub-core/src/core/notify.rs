// tracehub-core/src/core/notify.rs
// ============================================================================
// Module: TraceHub Notifications
// Description: Notification records, channels, and per-user preferences.
// Purpose: Model the in-app feed and the durable email outbox rows.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Lifecycle hooks publish [`Notification`] values onto the bus; each
//! notification is persisted as a durable outbox row before fan-out. Delivery
//! is at-least-once, so consumers must be idempotent on `notification_id`.
//! Per-user preferences gate which event kinds reach which channels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::NotificationId;
use crate::core::identifiers::OrgId;
use crate::core::identifiers::ShipmentId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Notification Kind
// ============================================================================

/// Notification event classification.
///
/// # Invariants
/// - Variants are stable for serialization and preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Document uploaded.
    DocumentUploaded,
    /// Document validated.
    DocumentValidated,
    /// Document rejected.
    DocumentRejected,
    /// Document expired.
    DocumentExpired,
    /// Document superseded by a new version.
    DocumentSuperseded,
    /// Shipment document set complete.
    ShipmentDocsComplete,
    /// Shipment departed.
    ShipmentDeparted,
    /// Shipment arrived.
    ShipmentArrived,
    /// Shipment held in customs.
    ShipmentCustomsHold,
    /// Shipment delivered.
    ShipmentDelivered,
    /// Shipment archived.
    ShipmentArchived,
    /// Compliance decision changed.
    ComplianceDecision,
    /// Carrier polling suspended after a permanent failure.
    TrackingSuspended,
    /// Invitation issued to an email address.
    InvitationIssued,
}

impl NotificationKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocumentUploaded => "document_uploaded",
            Self::DocumentValidated => "document_validated",
            Self::DocumentRejected => "document_rejected",
            Self::DocumentExpired => "document_expired",
            Self::DocumentSuperseded => "document_superseded",
            Self::ShipmentDocsComplete => "shipment_docs_complete",
            Self::ShipmentDeparted => "shipment_departed",
            Self::ShipmentArrived => "shipment_arrived",
            Self::ShipmentCustomsHold => "shipment_customs_hold",
            Self::ShipmentDelivered => "shipment_delivered",
            Self::ShipmentArchived => "shipment_archived",
            Self::ComplianceDecision => "compliance_decision",
            Self::TrackingSuspended => "tracking_suspended",
            Self::InvitationIssued => "invitation_issued",
        }
    }
}

// ============================================================================
// SECTION: Channels & Preferences
// ============================================================================

/// Delivery channel for a notification.
///
/// # Invariants
/// - Variants are stable for serialization and preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// In-app feed row.
    InApp,
    /// Email via the outbox dispatcher.
    Email,
}

/// Per-user notification preferences.
///
/// # Invariants
/// - Kinds absent from `channels` fall back to in-app only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationPreferences {
    /// Channel selections per event kind.
    pub channels: BTreeMap<NotificationKind, Vec<NotificationChannel>>,
}

impl NotificationPreferences {
    /// Returns the channels enabled for a kind (in-app by default).
    #[must_use]
    pub fn channels_for(&self, kind: NotificationKind) -> Vec<NotificationChannel> {
        self.channels.get(&kind).cloned().unwrap_or_else(|| vec![NotificationChannel::InApp])
    }
}

// ============================================================================
// SECTION: Notification
// ============================================================================

/// Durable notification record (outbox row and feed entry).
///
/// # Invariants
/// - `id` is the idempotency key for all consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Organization scope.
    pub organization_id: OrgId,
    /// Target user; `None` broadcasts to the organization feed.
    pub user_id: Option<UserId>,
    /// Event kind.
    pub kind: NotificationKind,
    /// Related shipment when applicable.
    pub shipment_id: Option<ShipmentId>,
    /// Short human-readable message.
    pub message: String,
    /// Structured payload for the frontend.
    pub payload: Value,
    /// Publication timestamp.
    pub created_at: Timestamp,
    /// When the email dispatcher consumed the outbox row.
    pub emailed_at: Option<Timestamp>,
    /// When the target user read the feed entry.
    pub read_at: Option<Timestamp>,
}
