// tracehub-providers/src/mailer.rs
// ============================================================================
// Module: Mailer Implementations
// Description: Development and test mail transports.
// Purpose: Exercise the outbox dispatch path without a live provider.
// Dependencies: serde_json, tracehub-core
// ============================================================================

//! ## Overview
//! Production mail delivery is an external collaborator; these transports
//! cover development (structured line to stderr) and tests (in-memory
//! capture). Both are idempotency-friendly: a resend simply emits again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use tracehub_core::interfaces::MailError;
use tracehub_core::interfaces::Mailer;
use tracehub_core::interfaces::MessageId;

// ============================================================================
// SECTION: Log Mailer
// ============================================================================

/// Development mailer writing one JSON line per message to stderr.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, template: &str, vars: &Value) -> Result<MessageId, MailError> {
        let line = json!({"event": "mail", "to": to, "template": template, "vars": vars});
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{line}");
        Ok(MessageId(format!("log:{template}:{to}")))
    }
}

// ============================================================================
// SECTION: Capture Mailer
// ============================================================================

/// One captured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMail {
    /// Recipient address.
    pub to: String,
    /// Template label.
    pub template: String,
    /// Rendered variables.
    pub vars: Value,
}

/// Test mailer capturing messages in memory.
///
/// # Invariants
/// - Messages are appended in send order.
#[derive(Default)]
pub struct CaptureMailer {
    /// Captured messages.
    messages: Mutex<Vec<CapturedMail>>,
}

impl CaptureMailer {
    /// Builds an empty capture mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured messages.
    #[must_use]
    pub fn captured(&self) -> Vec<CapturedMail> {
        self.messages.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl Mailer for CaptureMailer {
    fn send(&self, to: &str, template: &str, vars: &Value) -> Result<MessageId, MailError> {
        let mut guard =
            self.messages.lock().map_err(|_| MailError::Rejected("capture poisoned".to_string()))?;
        guard.push(CapturedMail {
            to: to.to_string(),
            template: template.to_string(),
            vars: vars.clone(),
        });
        Ok(MessageId(format!("capture:{}", guard.len())))
    }
}
