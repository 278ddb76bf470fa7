// tracehub-core/src/runtime/document_flow.rs
// ============================================================================
// Module: TraceHub Document Lifecycle
// Description: Static transition table for the document state machine.
// Purpose: Drive every document status change through one legal table.
// Dependencies: crate::core::document, serde, thiserror
// ============================================================================

//! ## Overview
//! Document lifecycle transitions are encoded as a static `(from, event) → to`
//! table. The same table drives the executor and the documentation generator;
//! transitions not present in the table fail with
//! [`DocumentFlowError::InvalidTransition`]. Expiry is the one time-driven
//! edge: it applies from any non-terminal status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::document::DocumentStatus;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Document lifecycle event.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentEvent {
    /// File bytes persisted and checksum recorded.
    FilePersisted,
    /// Manual review requested.
    ReviewRequested,
    /// Human approver accepted the document.
    Approved,
    /// Reviewer rejected the document (reason required by the executor).
    Rejected,
    /// Rules engine returned no ERROR-severity failures.
    CompliancePassed,
    /// Rules engine returned at least one ERROR failure.
    ComplianceFailed,
    /// All required documents for the parent shipment are compliant.
    Linked,
    /// Parent shipment reached a terminal state.
    ParentArchived,
    /// Expiry date passed (time-driven).
    Expired,
}

impl DocumentEvent {
    /// Returns a stable label for the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FilePersisted => "file_persisted",
            Self::ReviewRequested => "review_requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::CompliancePassed => "compliance_passed",
            Self::ComplianceFailed => "compliance_failed",
            Self::Linked => "linked",
            Self::ParentArchived => "parent_archived",
            Self::Expired => "expired",
        }
    }
}

// ============================================================================
// SECTION: Transition Table
// ============================================================================

/// Legal document transitions as `(from, event, to)` rows.
///
/// Expiry is intentionally absent: it applies from any non-terminal status
/// and is handled by [`DocumentFlow::apply`] directly.
pub const DOCUMENT_TRANSITIONS: &[(DocumentStatus, DocumentEvent, DocumentStatus)] = &[
    (DocumentStatus::Draft, DocumentEvent::FilePersisted, DocumentStatus::Uploaded),
    (DocumentStatus::Uploaded, DocumentEvent::ReviewRequested, DocumentStatus::PendingValidation),
    (DocumentStatus::Uploaded, DocumentEvent::Approved, DocumentStatus::Validated),
    (DocumentStatus::PendingValidation, DocumentEvent::Approved, DocumentStatus::Validated),
    (DocumentStatus::Uploaded, DocumentEvent::Rejected, DocumentStatus::Rejected),
    (DocumentStatus::Validated, DocumentEvent::Rejected, DocumentStatus::Rejected),
    (DocumentStatus::Validated, DocumentEvent::CompliancePassed, DocumentStatus::ComplianceOk),
    (DocumentStatus::Validated, DocumentEvent::ComplianceFailed, DocumentStatus::ComplianceFailed),
    (DocumentStatus::ComplianceOk, DocumentEvent::Linked, DocumentStatus::Linked),
    (DocumentStatus::ComplianceFailed, DocumentEvent::Linked, DocumentStatus::Linked),
    (DocumentStatus::Linked, DocumentEvent::ParentArchived, DocumentStatus::Archived),
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document lifecycle errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentFlowError {
    /// The `(from, event)` pair is not in the legal table.
    #[error("invalid document transition: {from} on {event}")]
    InvalidTransition {
        /// Status the document was in.
        from: &'static str,
        /// Event that was applied.
        event: &'static str,
    },
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Document lifecycle executor over the static table.
pub struct DocumentFlow;

impl DocumentFlow {
    /// Applies an event to a status, returning the successor status.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentFlowError::InvalidTransition`] when the pair is not
    /// in the legal table.
    pub fn apply(
        from: DocumentStatus,
        event: DocumentEvent,
    ) -> Result<DocumentStatus, DocumentFlowError> {
        if event == DocumentEvent::Expired {
            if from.is_terminal() {
                return Err(DocumentFlowError::InvalidTransition {
                    from: from.as_str(),
                    event: event.as_str(),
                });
            }
            return Ok(DocumentStatus::Expired);
        }
        DOCUMENT_TRANSITIONS
            .iter()
            .find(|(f, e, _)| *f == from && *e == event)
            .map(|(_, _, to)| *to)
            .ok_or(DocumentFlowError::InvalidTransition {
                from: from.as_str(),
                event: event.as_str(),
            })
    }

    /// Returns the legal transition table (expiry edges excluded).
    #[must_use]
    pub const fn transitions() -> &'static [(DocumentStatus, DocumentEvent, DocumentStatus)] {
        DOCUMENT_TRANSITIONS
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
