// tracehub-store-sqlite/src/notify.rs
// ============================================================================
// Module: Notification Persistence
// Description: Durable notification outbox and in-app feed reads.
// Purpose: Guarantee at-least-once delivery with idempotent consumers.
// Dependencies: crate::store, rusqlite, tracehub-core
// ============================================================================

//! ## Overview
//! Every published notification lands as a durable row before fan-out: the
//! in-app feed reads rows directly, and the email dispatcher drains rows
//! whose `emailed_at` is unset. Consumers key idempotency on the
//! notification id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::Value;
use tracehub_core::Notification;
use tracehub_core::NotificationId;
use tracehub_core::NotificationKind;
use tracehub_core::NotificationPreferences;
use tracehub_core::OrgId;
use tracehub_core::ShipmentId;
use tracehub_core::Timestamp;
use tracehub_core::UserId;
use tracehub_core::interfaces::StoreError;

use crate::store::TenantSession;
use crate::store::from_json;
use crate::store::id_to_i64;
use crate::store::org_to_i64;
use crate::store::to_json;

// ============================================================================
// SECTION: Outbox Writes
// ============================================================================

impl TenantSession<'_> {
    /// Inserts a durable notification row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure.
    pub fn insert_notification(
        &self,
        organization_id: OrgId,
        user_id: Option<UserId>,
        kind: NotificationKind,
        shipment_id: Option<ShipmentId>,
        message: &str,
        payload: Value,
        now: Timestamp,
    ) -> Result<Notification, StoreError> {
        self.check_write_org(organization_id)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let id = self.next_id(&tx, "notifications")?;
        let notification = Notification {
            id: NotificationId::from_raw(id)
                .ok_or_else(|| StoreError::Corrupt("zero id".to_string()))?,
            organization_id,
            user_id,
            kind,
            shipment_id,
            message: message.to_string(),
            payload,
            created_at: now,
            emailed_at: None,
            read_at: None,
        };
        tx.execute(
            "INSERT INTO notifications
                 (id, organization_id, user_id, kind, shipment_id, created_at, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id_to_i64(id),
                org_to_i64(organization_id),
                user_id.map(|user| id_to_i64(user.get())),
                kind.as_str(),
                shipment_id.map(|shipment| id_to_i64(shipment.get())),
                now.unix_millis(),
                to_json(&notification)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(notification)
    }

    /// Lists the feed for the session's organization, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or unscoped sessions.
    pub fn notification_feed(&self, limit: usize) -> Result<Vec<Notification>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM notifications
                 WHERE (organization_id = ?1 OR ?2)
                 ORDER BY created_at DESC, id DESC LIMIT ?3",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    self.org_param(),
                    self.is_system_admin(),
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut notifications = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            notifications.push(from_json(&json)?);
        }
        Ok(notifications)
    }

    /// Marks a feed entry as read by its target user.
    ///
    /// Idempotent: a second call leaves the original read timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for invisible rows.
    pub fn mark_notification_read(
        &self,
        notification_id: NotificationId,
        now: Timestamp,
    ) -> Result<Notification, StoreError> {
        self.require_scope()?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(|err| StoreError::Io(err.to_string()))?;
        let json: Option<String> = tx
            .query_row(
                "SELECT record_json FROM notifications
                 WHERE id = ?1 AND (organization_id = ?2 OR ?3)",
                params![id_to_i64(notification_id.get()), self.org_param(), self.is_system_admin()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut notification: Notification = json.map_or_else(
            || Err(StoreError::NotFound(format!("notification {notification_id}"))),
            |snapshot| from_json(&snapshot),
        )?;
        if notification.read_at.is_none() {
            notification.read_at = Some(now);
            tx.execute(
                "UPDATE notifications SET read_at = ?2, record_json = ?3 WHERE id = ?1",
                params![
                    id_to_i64(notification_id.get()),
                    now.unix_millis(),
                    to_json(&notification)?
                ],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        }
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(notification)
    }

    /// Drains outbox rows not yet consumed by the email dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn outbox_pending(&self, limit: usize) -> Result<Vec<Notification>, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM notifications
                 WHERE emailed_at IS NULL AND (organization_id = ?1 OR ?2)
                 ORDER BY created_at, id LIMIT ?3",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    self.org_param(),
                    self.is_system_admin(),
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut notifications = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            notifications.push(from_json(&json)?);
        }
        Ok(notifications)
    }

    /// Marks an outbox row as consumed by the email dispatcher.
    ///
    /// Idempotent on the notification id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure.
    pub fn mark_notification_emailed(
        &self,
        notification_id: NotificationId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE notifications
             SET emailed_at = ?2,
                 record_json = json_set(record_json, '$.emailed_at', ?2)
             WHERE id = ?1 AND emailed_at IS NULL",
            params![id_to_i64(notification_id.get()), now.unix_millis()],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Loads per-user notification preferences (defaults when unset).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub fn notification_preferences(
        &self,
        user_id: UserId,
    ) -> Result<NotificationPreferences, StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM notification_preferences WHERE user_id = ?1",
                params![id_to_i64(user_id.get())],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        json.map_or_else(|| Ok(NotificationPreferences::default()), |snapshot| from_json(&snapshot))
    }

    /// Saves per-user notification preferences.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure.
    pub fn save_notification_preferences(
        &self,
        user_id: UserId,
        preferences: &NotificationPreferences,
    ) -> Result<(), StoreError> {
        self.require_scope()?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO notification_preferences (user_id, record_json) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET record_json = excluded.record_json",
            params![id_to_i64(user_id.get()), to_json(preferences)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }
}
