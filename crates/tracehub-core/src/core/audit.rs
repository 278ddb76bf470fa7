// tracehub-core/src/core/audit.rs
// ============================================================================
// Module: TraceHub Audit Logging
// Description: Append-only audit records and pluggable audit sinks.
// Purpose: Emit structured audit events without hard logging dependencies.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every state transition, security decision, and tenant violation produces an
//! [`AuditRecord`]. Records that accompany a business mutation are written by
//! the store inside the same transaction; sink implementations here cover the
//! request path (security events, request completion) where no transaction
//! exists. Deployments route sinks to their preferred pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::OrgId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Audit Action
// ============================================================================

/// Audited action classification.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity updated.
    Update,
    /// Entity soft-deleted or suspended.
    Delete,
    /// Lifecycle status transition.
    Transition,
    /// Rules engine evaluation.
    Evaluate,
    /// Issue override recorded.
    Override,
    /// Invitation issued.
    Invite,
    /// Invitation accepted.
    AcceptInvite,
    /// Cross-tenant or permission violation observed.
    SecurityViolation,
    /// Request completed (request-path sink only).
    RequestCompleted,
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Append-only audit record.
///
/// # Invariants
/// - Records are never updated or deleted after emission.
/// - `details` must not contain secrets or raw document bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Event timestamp.
    pub timestamp: Timestamp,
    /// Organization scope; `None` for platform-level events.
    pub organization_id: Option<OrgId>,
    /// Acting user when known.
    pub user_id: Option<UserId>,
    /// Audited action.
    pub action: AuditAction,
    /// Resource family label (e.g. `document`, `shipment`).
    pub resource_type: String,
    /// Resource identifier rendered as a string.
    pub resource_id: Option<String>,
    /// Structured event details (previous/new status, reason, ...).
    pub details: Value,
    /// Request identifier tying the record to an API response.
    pub request_id: Option<RequestId>,
}

// ============================================================================
// SECTION: Audit Sinks
// ============================================================================

/// Audit sink for request-path records.
pub trait AuditSink: Send + Sync {
    /// Emits one audit record.
    fn emit(&self, record: &AuditRecord);
}

/// No-op audit sink.
///
/// # Invariants
/// - Discards every record.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _record: &AuditRecord) {}
}

/// Stderr audit sink writing one JSON object per line.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn emit(&self, record: &AuditRecord) {
        if let Ok(line) = serde_json::to_string(record) {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{line}");
        }
    }
}

/// File audit sink appending one JSON object per line.
///
/// # Invariants
/// - Writes are serialized through an internal mutex.
pub struct FileAuditSink {
    /// Open append handle guarded for concurrent emitters.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn emit(&self, record: &AuditRecord) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}
